use crate::types::{RefId, SiteId, Target};

/// Resolution of path occurrences and field sites to their definitions
pub trait ReferenceResolver {
    fn resolve(&self, reference: RefId) -> Option<Target>;

    /// Field or method a field access, method call or destructuring site uses
    fn resolve_site(&self, site: SiteId) -> Option<Target>;
}
