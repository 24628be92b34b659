/// Channel layout of a decoded raster. Only the variants these two cores
/// actually produce are present: CMYK/YCCK JPEGs are rejected at the SOF
/// component-count check rather than decoded, so no 4-component non-alpha
/// variant is needed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ColorSpace
{
    RGB,
    RGBA,
    YCbCr,
    Luma,
    LumaA,
    Unknown,
}
impl ColorSpace
{
    pub const fn num_components(&self) -> usize
    {
        match self
        {
            Self::RGB | Self::YCbCr => 3,
            Self::RGBA => 4,
            Self::Luma => 1,
            Self::LumaA => 2,
            Self::Unknown => 0,
        }
    }

    pub const fn has_alpha(&self) -> bool
    {
        matches!(self, Self::RGBA | Self::LumaA)
    }

    pub const fn is_grayscale(&self) -> bool
    {
        matches!(self, Self::LumaA | Self::Luma)
    }
}

impl Default for ColorSpace
{
    fn default() -> Self
    {
        Self::Unknown
    }
}

/// Every colorspace a decoded `ImageInfo` can report.
pub static ALL_COLORSPACES: [ColorSpace; 5] = [
    ColorSpace::RGB,
    ColorSpace::RGBA,
    ColorSpace::LumaA,
    ColorSpace::Luma,
    ColorSpace::YCbCr,
];
