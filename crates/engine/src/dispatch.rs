//! Discriminator dispatch
//!
//! Decode reads the tag straight from the raw input, as a literal scalar,
//! before any field routine runs. The resolved concrete type then decodes
//! the entire input under its own schema, so every field is validated
//! against the concrete type and not only the ones it adds. The concrete
//! type is decoded directly, never dispatched again, even when it inherits
//! the discriminator.
//!
//! Encode never looks at tags: the runtime record's own type must be one of
//! the tagged candidates, and the tag comes out as an ordinary field.

use crate::codec::{decode_concrete, encode_concrete, Ctx};
use crate::error::{CodecError, Result, ROOT};
use crate::subtype::{DispatchSite, Hierarchy, TagIndex};
use shapeshift_core::{Record, Tag, Value};
use tracing::trace;

/// Resolved dispatch site
pub struct DispatchPlan {
    site: DispatchSite,
    index: TagIndex,
}

impl DispatchPlan {
    /// Build the tag index for a site against a hierarchy snapshot
    pub fn build(hierarchy: &Hierarchy, site: DispatchSite) -> Result<Self> {
        let index = hierarchy.tag_index(&site)?;
        Ok(Self { site, index })
    }

    /// Dispatch site this plan was built for
    pub fn site(&self) -> &DispatchSite {
        &self.site
    }

    /// Tag index at build time
    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    pub(crate) fn decode(&self, raw: &Value, ctx: &Ctx<'_>) -> Result<Record> {
        let object = raw
            .as_object()
            .ok_or_else(|| CodecError::invalid("object", raw.type_name()))?;
        let field = self.index.field();
        let tag_value = object
            .get(field)
            .ok_or_else(|| CodecError::MissingDiscriminant {
                path: ROOT.to_string(),
                field: field.to_string(),
            })?;
        let tag = Tag::from_value(tag_value)
            .ok_or_else(|| self.index.unknown(tag_value.type_name().to_string()))?;

        let concrete = ctx.record_type(self.index.resolve(&tag)?)?;
        trace!(tag = %tag, record = %concrete.name(), "dispatched on discriminator");
        decode_concrete(concrete, raw, ctx)
    }

    pub(crate) fn encode(&self, record: &Record, ctx: &Ctx<'_>) -> Result<Value> {
        self.check(record, ctx.hierarchy)?;
        encode_concrete(record, ctx)
    }

    /// Require the record's type to be a tagged candidate
    pub(crate) fn check(&self, record: &Record, hierarchy: &Hierarchy) -> Result<()> {
        if self.index.tag_of(record.ty()).is_some() {
            return Ok(());
        }
        Err(CodecError::UnsupportedVariant {
            path: ROOT.to_string(),
            record: record.type_name().to_string(),
            expected: self.describe(hierarchy),
        })
    }

    fn describe(&self, hierarchy: &Hierarchy) -> String {
        let names: Vec<&str> = self
            .site
            .roots()
            .iter()
            .filter_map(|id| hierarchy.get(*id).map(|t| t.name()))
            .collect();
        format!("{} (by '{}')", names.join(" | "), self.index.field())
    }
}
