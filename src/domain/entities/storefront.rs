/// The regional App Store / Play Store the user is currently signed in to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storefront {
    /// Store-specific identifier of the storefront. May be empty if the
    /// platform does not expose one.
    pub id: String,
    /// ISO 3166-1 alpha-3 country code.
    pub country_code: String,
}

impl Storefront {
    pub fn country(&self) -> Option<rust_iso3166::CountryCode> {
        rust_iso3166::from_alpha3(&self.country_code)
    }
}
