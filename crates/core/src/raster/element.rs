//! Raster element trait for categorical cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for integer types that can hold a category value in a raster cell.
///
/// Category values and combined codes are handled as `i64` by the
/// classification engines; this trait converts between that and the
/// storage type.
pub trait RasterElement:
    Copy + Clone + Debug + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        matches!(nodata, Some(nd) if *self == nd)
    }

    /// Widen to a category value
    fn to_class(self) -> Option<i64> {
        NumCast::from(self)
    }

    /// Narrow a category value or code into this type, if it fits
    fn from_class(value: i64) -> Option<Self> {
        NumCast::from(value)
    }
}

macro_rules! impl_raster_element {
    ($t:ty, $nodata:expr) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                $nodata
            }
        }
    };
}

// Unsigned types reserve MAX: 0 is a real class in NLCD ("Unclassified").
impl_raster_element!(u8, u8::MAX);
impl_raster_element!(u16, u16::MAX);
impl_raster_element!(u32, u32::MAX);
impl_raster_element!(i16, i16::MIN);
impl_raster_element!(i32, i32::MIN);
impl_raster_element!(i64, i64::MIN);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodata_detection() {
        assert!(255u8.is_nodata(Some(u8::default_nodata())));
        assert!(!0u8.is_nodata(Some(255)));
        assert!(!7i32.is_nodata(None));
    }

    #[test]
    fn test_class_conversion() {
        assert_eq!(95u8.to_class(), Some(95));
        assert_eq!(u8::from_class(4121), None);
        assert_eq!(u16::from_class(4121), Some(4121));
        assert_eq!(i32::from_class(-1), Some(-1));
    }
}
