//! Type-erased container for item values.

/// The value an item model exposes for a row.
///
/// Provides type-safe access through the `as_*` methods and the generic
/// [`downcast`](ItemData::downcast) method. Items that are not strings need a
/// display extractor before they can participate in text filtering.
///
/// # Example
///
/// ```
/// use typeahead::ItemData;
///
/// let data = ItemData::from("Hello");
/// assert_eq!(data.as_string(), Some("Hello"));
///
/// let data = ItemData::new(42u32);
/// assert_eq!(data.downcast::<u32>(), Some(&42));
/// ```
#[derive(Debug, Default)]
pub enum ItemData {
    /// No data (absent item placeholder, or out-of-bounds row).
    #[default]
    None,
    /// String data.
    String(String),
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Boolean data.
    Bool(bool),
    /// Custom data (type-erased).
    Custom(Box<dyn std::any::Any + Send + Sync>),
}

impl Clone for ItemData {
    fn clone(&self) -> Self {
        match self {
            ItemData::None => ItemData::None,
            ItemData::String(s) => ItemData::String(s.clone()),
            ItemData::Int(n) => ItemData::Int(*n),
            ItemData::Float(n) => ItemData::Float(*n),
            ItemData::Bool(b) => ItemData::Bool(*b),
            // Custom data cannot be cloned; becomes None
            ItemData::Custom(_) => ItemData::None,
        }
    }
}

impl ItemData {
    /// Creates new custom data from any type.
    pub fn new<T: std::any::Any + Send + Sync + 'static>(value: T) -> Self {
        ItemData::Custom(Box::new(value))
    }

    /// Returns `true` if this is `ItemData::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, ItemData::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the data as a string slice.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ItemData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the data as an owned string.
    pub fn into_string(self) -> Option<String> {
        match self {
            ItemData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get the data as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemData::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ItemData::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemData::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to downcast custom data to the specified type.
    pub fn downcast<T: std::any::Any>(&self) -> Option<&T> {
        match self {
            ItemData::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<String> for ItemData {
    fn from(s: String) -> Self {
        ItemData::String(s)
    }
}

impl From<&str> for ItemData {
    fn from(s: &str) -> Self {
        ItemData::String(s.to_string())
    }
}

impl From<i64> for ItemData {
    fn from(n: i64) -> Self {
        ItemData::Int(n)
    }
}

impl From<i32> for ItemData {
    fn from(n: i32) -> Self {
        ItemData::Int(n as i64)
    }
}

impl From<f64> for ItemData {
    fn from(n: f64) -> Self {
        ItemData::Float(n)
    }
}

impl From<bool> for ItemData {
    fn from(b: bool) -> Self {
        ItemData::Bool(b)
    }
}

impl From<Option<String>> for ItemData {
    fn from(opt: Option<String>) -> Self {
        match opt {
            Some(s) => ItemData::String(s),
            None => ItemData::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_data_string() {
        let data = ItemData::from("hello");
        assert_eq!(data.as_string(), Some("hello"));
        assert!(data.as_int().is_none());
    }

    #[test]
    fn test_item_data_custom() {
        #[derive(Debug, PartialEq)]
        struct MyData(u32);

        let data = ItemData::new(MyData(42));
        assert_eq!(data.downcast::<MyData>(), Some(&MyData(42)));
        assert!(data.downcast::<u32>().is_none());
    }

    #[test]
    fn test_custom_data_clones_to_none() {
        let data = ItemData::new(7u8);
        assert!(data.clone().is_none());
    }
}
