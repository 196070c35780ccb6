/// License-type rule selecting the retail-relevant rows of a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Keep rows whose type is exactly one of the listed codes
    Allow(Vec<String>),
    /// Keep rows whose type is none of the listed codes (rows without a type are kept)
    Deny(Vec<String>),
    /// Keep rows whose type text contains any of the listed fragments
    Contains(Vec<String>),
}

impl CategoryFilter {
    pub fn allows(&self, value: Option<&str>) -> bool {
        match self {
            CategoryFilter::Allow(codes) => {
                value.is_some_and(|v| codes.iter().any(|c| c == v.trim()))
            }
            CategoryFilter::Deny(codes) => {
                value.map_or(true, |v| !codes.iter().any(|c| c == v.trim()))
            }
            CategoryFilter::Contains(fragments) => {
                value.is_some_and(|v| fragments.iter().any(|f| v.contains(f.as_str())))
            }
        }
    }
}
