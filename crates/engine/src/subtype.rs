//! Subtype registry
//!
//! Every defined record type lives in an append-only arena ([`Hierarchy`])
//! together with its parent/child links, a generation counter per type and
//! the dispatch sites known so far. Readers take an `Arc` snapshot and never
//! lock while decoding; `define` clones the current snapshot, applies the new
//! type, validates every affected dispatch site and only then publishes the
//! new snapshot. A definition that fails leaves the published hierarchy
//! untouched.
//!
//! # Generations
//!
//! Registering a concrete type under a parent bumps the generation of the
//! parent and of every further ancestor. Compiled codecs that contain a
//! dispatch plan remember the generations of their roots and are rebuilt
//! once those move.
//!
//! # Tag indexes
//!
//! A [`TagIndex`] maps literal tags to concrete types for one
//! [`DispatchSite`]. Candidates without a literal default for the tag field
//! are skipped, but their descendants are still visited. Two distinct types
//! claiming one tag is a [`CodecError::ConflictingDiscriminant`].

use crate::error::{CodecError, Result, ROOT};
use crate::schema::{DiscriminatorSpec, RecordDef, RecordType};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use shapeshift_core::{RecordTypeId, Tag};
use std::sync::Arc;
use tracing::debug;

/// A place where tag dispatch happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSite {
    roots: Vec<RecordTypeId>,
    spec: DiscriminatorSpec,
    self_site: bool,
}

impl DispatchSite {
    /// Type-level discriminator on `root`
    pub fn self_discriminated(root: RecordTypeId, spec: DiscriminatorSpec) -> Self {
        Self {
            roots: vec![root],
            spec,
            self_site: true,
        }
    }

    /// Field annotation dispatching among `roots`
    pub fn annotated(roots: Vec<RecordTypeId>, spec: DiscriminatorSpec) -> Self {
        Self {
            roots,
            spec,
            self_site: false,
        }
    }

    /// Explicit variants
    pub fn roots(&self) -> &[RecordTypeId] {
        &self.roots
    }

    /// Discriminator configuration
    pub fn spec(&self) -> &DiscriminatorSpec {
        &self.spec
    }

    fn includes_roots(&self) -> bool {
        self.self_site || !self.spec.includes_subtypes() || self.spec.includes_supertypes()
    }
}

/// Tag to concrete type map for one dispatch site
#[derive(Debug, Clone)]
pub struct TagIndex {
    field: String,
    by_tag: FxHashMap<Tag, RecordTypeId>,
    by_type: FxHashMap<RecordTypeId, Tag>,
}

impl TagIndex {
    /// Tag field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Concrete type for a tag
    pub fn resolve(&self, tag: &Tag) -> Result<RecordTypeId> {
        self.by_tag
            .get(tag)
            .copied()
            .ok_or_else(|| self.unknown(tag.to_string()))
    }

    /// Tag a concrete type is registered under
    pub fn tag_of(&self, ty: RecordTypeId) -> Option<&Tag> {
        self.by_type.get(&ty)
    }

    /// Known tags, rendered and sorted
    pub fn known_tags(&self) -> Vec<String> {
        let mut tags: Vec<&Tag> = self.by_tag.keys().collect();
        tags.sort();
        tags.into_iter().map(|t| t.to_string()).collect()
    }

    /// Number of tagged candidates
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Check if no candidate is tagged
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub(crate) fn unknown(&self, rendered: String) -> CodecError {
        CodecError::UnknownDiscriminant {
            path: ROOT.to_string(),
            field: self.field.clone(),
            tag: rendered,
            known: self.known_tags(),
        }
    }
}

/// Immutable snapshot of all defined record types
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    types: Vec<Arc<RecordType>>,
    by_name: FxHashMap<Arc<str>, RecordTypeId>,
    children: Vec<Vec<RecordTypeId>>,
    generations: Vec<u64>,
    sites: Vec<DispatchSite>,
}

impl Hierarchy {
    /// Record type by id
    pub fn get(&self, id: RecordTypeId) -> Option<&Arc<RecordType>> {
        self.types.get(id.index())
    }

    /// Record type by name
    pub fn lookup(&self, name: &str) -> Option<&Arc<RecordType>> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// Number of defined types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no type is defined
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Direct children of a type, in definition order
    pub fn children(&self, id: RecordTypeId) -> &[RecordTypeId] {
        self.children.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive descendants of a type, depth first, excluding the type itself
    pub fn descendants(&self, id: RecordTypeId) -> Vec<RecordTypeId> {
        let mut out = Vec::new();
        let mut stack: Vec<RecordTypeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `ty` is `ancestor` or descends from it
    pub fn is_descendant(&self, ty: RecordTypeId, ancestor: RecordTypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|t| t.parent());
        }
        false
    }

    /// Generation counter of a type
    pub fn generation(&self, id: RecordTypeId) -> u64 {
        self.generations.get(id.index()).copied().unwrap_or(0)
    }

    /// Combined generation of a set of roots
    ///
    /// Generations only grow, so the sum changes whenever any of them does.
    pub fn stamp(&self, roots: &[RecordTypeId]) -> u64 {
        roots.iter().map(|r| self.generation(*r)).sum()
    }

    /// Dispatch sites known so far
    pub fn sites(&self) -> &[DispatchSite] {
        &self.sites
    }

    /// Candidate types for a site, before tag filtering
    pub fn candidates(&self, site: &DispatchSite) -> Vec<RecordTypeId> {
        let mut out = Vec::new();
        for root in &site.roots {
            if site.includes_roots() {
                out.push(*root);
            }
            if site.spec.includes_subtypes() {
                out.extend(self.descendants(*root));
            }
        }
        out
    }

    /// Build the tag index for a site
    pub fn tag_index(&self, site: &DispatchSite) -> Result<TagIndex> {
        let field = site.spec.field();
        let mut index = TagIndex {
            field: field.to_string(),
            by_tag: FxHashMap::default(),
            by_type: FxHashMap::default(),
        };

        for id in self.candidates(site) {
            let Some(ty) = self.get(id) else { continue };
            // Untagged intermediates are skipped; descendants are already listed
            let Some(tag) = ty.tag(field) else { continue };
            match index.by_tag.get(&tag) {
                Some(existing) if *existing != id => {
                    let existing_name = self
                        .get(*existing)
                        .map(|t| t.name().to_string())
                        .unwrap_or_default();
                    return Err(CodecError::ConflictingDiscriminant {
                        field: field.to_string(),
                        tag: tag.to_string(),
                        existing: existing_name,
                        incoming: ty.name().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    index.by_type.insert(id, tag.clone());
                    index.by_tag.insert(tag, id);
                }
            }
        }
        Ok(index)
    }

    /// Resolve a tag at a site against this snapshot
    pub fn resolve(&self, site: &DispatchSite, tag: &Tag) -> Result<RecordTypeId> {
        self.tag_index(site)?.resolve(tag)
    }

    fn push(&mut self, ty: Arc<RecordType>) {
        self.by_name.insert(Arc::clone(ty.shared_name()), ty.id());
        self.types.push(ty);
        self.children.push(Vec::new());
        self.generations.push(0);
    }

    /// Record `concrete` under `base` and bump every ancestor's generation
    fn register(&mut self, base: RecordTypeId, concrete: RecordTypeId) {
        let Some(children) = self.children.get_mut(base.index()) else {
            return;
        };
        if children.contains(&concrete) {
            return;
        }
        children.push(concrete);

        let mut current = Some(base);
        while let Some(id) = current {
            if let Some(generation) = self.generations.get_mut(id.index()) {
                *generation += 1;
                debug!(ancestor = %id, generation = *generation, "bumped subtype generation");
            }
            current = self.get(id).and_then(|t| t.parent());
        }
    }

    /// Record the sites `ty` declares and return them
    fn add_sites(&mut self, ty: &RecordType) -> Vec<DispatchSite> {
        let mut new_sites = Vec::new();
        if let Some(spec) = ty.discriminator() {
            new_sites.push(DispatchSite::self_discriminated(ty.id(), spec.clone()));
        }
        for field in ty.fields() {
            if let (Some(spec), Some(roots)) = (field.discriminator(), field.ty().dispatch_roots()) {
                new_sites.push(DispatchSite::annotated(roots, spec.clone()));
            }
        }
        for site in &new_sites {
            if !self.sites.contains(site) {
                self.sites.push(site.clone());
            }
        }
        new_sites
    }

    fn validate_references(&self, ty: &RecordType) -> Result<()> {
        let mut referenced = Vec::new();
        for field in ty.fields() {
            field.ty().referenced_records(&mut referenced);
        }
        match referenced.into_iter().find(|id| self.get(*id).is_none()) {
            Some(missing) => Err(CodecError::UnknownRecordType(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Rebuild every site the new type can appear in or declares
    fn check_sites(&self, ty: RecordTypeId, declared: &[DispatchSite]) -> Result<()> {
        for site in &self.sites {
            if declared.contains(site)
                || site.roots.iter().any(|root| self.is_descendant(ty, *root))
            {
                self.tag_index(site)?;
            }
        }
        Ok(())
    }
}

/// Live registry of record types
///
/// # Thread Safety
///
/// Reads clone an `Arc` under a short read lock. Definitions are serialized
/// by a separate mutex so the copy-on-write update never races another
/// writer; the read lock is only taken for the final pointer swap.
#[derive(Default)]
pub struct SubtypeRegistry {
    current: RwLock<Arc<Hierarchy>>,
    write_lock: Mutex<()>,
}

impl SubtypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Hierarchy> {
        Arc::clone(&self.current.read())
    }

    /// Define a record type and register it under its parent
    pub fn define(&self, def: RecordDef) -> Result<Arc<RecordType>> {
        let _guard = self.write_lock.lock();
        let mut next = Hierarchy::clone(&self.snapshot());

        if next.lookup(def.name()).is_some() {
            return Err(CodecError::InvalidDefinition {
                record: def.name().to_string(),
                reason: "a record type with this name is already defined".to_string(),
            });
        }
        let parent = match def.parent() {
            Some(parent_id) => Some(Arc::clone(
                next.get(parent_id)
                    .ok_or_else(|| CodecError::UnknownRecordType(parent_id.to_string()))?,
            )),
            None => None,
        };

        let id = RecordTypeId::from_index(next.len()).ok_or_else(|| {
            CodecError::InvalidDefinition {
                record: def.name().to_string(),
                reason: "record type arena is full".to_string(),
            }
        })?;
        let ty = Arc::new(def.build(id, parent.as_deref())?);
        next.validate_references(&ty)?;

        next.push(Arc::clone(&ty));
        if let Some(parent_id) = ty.parent() {
            next.register(parent_id, id);
        }
        let declared = next.add_sites(&ty);
        next.check_sites(id, &declared)?;

        *self.current.write() = Arc::new(next);
        debug!(record = %ty.name(), id = %id, parent = ?ty.parent(), "defined record type");
        Ok(ty)
    }

    /// Record type by id
    pub fn get(&self, id: RecordTypeId) -> Option<Arc<RecordType>> {
        self.snapshot().get(id).cloned()
    }

    /// Record type by name
    pub fn lookup(&self, name: &str) -> Option<Arc<RecordType>> {
        self.snapshot().lookup(name).cloned()
    }

    /// Generation counter of a type
    pub fn generation(&self, id: RecordTypeId) -> u64 {
        self.snapshot().generation(id)
    }

    /// Transitive descendants of a type
    pub fn descendants(&self, id: RecordTypeId) -> Vec<RecordTypeId> {
        self.snapshot().descendants(id)
    }

    /// Resolve a tag among the candidates of `roots` under `spec`
    pub fn resolve(
        &self,
        roots: &[RecordTypeId],
        spec: &DiscriminatorSpec,
        tag: &Tag,
    ) -> Result<RecordTypeId> {
        let site = DispatchSite::annotated(roots.to_vec(), spec.clone());
        self.snapshot().resolve(&site, tag)
    }

    /// Number of defined types
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if no type is defined
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
