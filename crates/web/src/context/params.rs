//! Path parameters and best-effort conversion of raw parameter text.

/// Parameters captured while resolving the request path, in path order.
///
/// For the route `/user/:id`, the request `/user/42` yields `id = "42"`. Values are the request
/// segments verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<(String, String)>> for PathParams {
    fn from(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }
}

/// Conversion from the raw text of a query, form or path parameter.
///
/// Returns `None` when the text is not a valid representation of `Self`.
pub trait FromParam: Sized {
    fn from_param(raw: &str) -> Option<Self>;
}

macro_rules! from_param_by_parse {
    ($($ty:ty),*) => {
        $(
            impl FromParam for $ty {
                #[inline]
                fn from_param(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

from_param_by_parse!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FromParam for bool {
    fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
            _ => None,
        }
    }
}

impl FromParam for String {
    #[inline]
    fn from_param(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(i64::from_param("-17"), Some(-17));
        assert_eq!(isize::from_param("3"), Some(3));
        assert_eq!(u8::from_param("256"), None);
        assert_eq!(f32::from_param("1.5"), Some(1.5));
        assert_eq!(f64::from_param("abc"), None);
    }

    #[test]
    fn booleans() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(bool::from_param(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(bool::from_param(raw), Some(false), "{raw}");
        }
        assert_eq!(bool::from_param("yes"), None);
    }

    #[test]
    fn lookup_by_name() {
        let params = PathParams::from(vec![("id".to_owned(), "42".to_owned()), ("tab".to_owned(), "Posts".to_owned())]);

        assert_eq!(params.get("tab"), Some("Posts"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.iter().map(|(key, _)| key).collect::<Vec<_>>(), ["id", "tab"]);
    }
}
