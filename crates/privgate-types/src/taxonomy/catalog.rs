//! Standard catalog shipped with PrivGate

use super::library::ThirdPartyLibrary;
use super::permission::{PermissionKind, ProtectionTier, Sensitivity};
use super::purpose::Purpose;
use super::registry::{Taxonomy, TaxonomyBuilder};

const PERMISSIONS: &[(&str, &str, Sensitivity, ProtectionTier)] = &[
    ("CAMERA", "Camera", Sensitivity::High, ProtectionTier::Dangerous),
    ("MICROPHONE", "Microphone", Sensitivity::High, ProtectionTier::Dangerous),
    ("FINE_LOCATION", "Precise location", Sensitivity::High, ProtectionTier::Dangerous),
    ("COARSE_LOCATION", "Approximate location", Sensitivity::Medium, ProtectionTier::Dangerous),
    ("CONTACTS", "Contacts", Sensitivity::High, ProtectionTier::Dangerous),
    ("CALENDAR", "Calendar", Sensitivity::Medium, ProtectionTier::Dangerous),
    ("CALL_LOG", "Call log", Sensitivity::High, ProtectionTier::Dangerous),
    ("SMS", "Text messages", Sensitivity::High, ProtectionTier::Dangerous),
    ("STORAGE", "Shared storage", Sensitivity::Medium, ProtectionTier::Dangerous),
    ("BODY_SENSORS", "Body sensors", Sensitivity::High, ProtectionTier::Dangerous),
    ("PHONE_STATE", "Phone identity", Sensitivity::Medium, ProtectionTier::Dangerous),
    ("ACCOUNTS", "Device accounts", Sensitivity::Low, ProtectionTier::Normal),
];

const PURPOSES: &[(&str, &str)] = &[
    ("RUNNING_OTHER_FEATURES", "Running the app's own features"),
    ("DISPLAY_ADVERTISEMENT", "Showing advertisements"),
    ("ANALYTICS", "Usage analytics"),
    ("NAVIGATION", "Navigation and maps"),
    ("SOCIAL_NETWORK_SERVICE", "Social network integration"),
    ("CRASH_REPORTING", "Crash reporting"),
    ("PERSONALIZATION", "Personalized content"),
    ("SEARCH_NEARBY_PLACES", "Searching nearby places"),
    ("BACKUP_AND_SYNC", "Backup and synchronization"),
    ("PAYMENT", "Payments"),
];

// Order matters: origin lookup takes the first substring match, so narrower
// prefixes sharing a root with broader ones are listed first.
const VENDORS: &[(&str, &str, &str)] = &[
    ("com.google.android.gms.ads", "Google Mobile Ads", "DISPLAY_ADVERTISEMENT"),
    ("com.google.android.gms.maps", "Google Maps", "NAVIGATION"),
    ("com.google.firebase.analytics", "Firebase Analytics", "ANALYTICS"),
    ("com.facebook.ads", "Meta Audience Network", "DISPLAY_ADVERTISEMENT"),
    ("com.facebook", "Facebook SDK", "SOCIAL_NETWORK_SERVICE"),
    ("com.mopub", "MoPub", "DISPLAY_ADVERTISEMENT"),
    ("com.inmobi", "InMobi", "DISPLAY_ADVERTISEMENT"),
    ("com.unity3d.ads", "Unity Ads", "DISPLAY_ADVERTISEMENT"),
    ("com.flurry", "Flurry Analytics", "ANALYTICS"),
    ("com.crashlytics", "Crashlytics", "CRASH_REPORTING"),
    ("com.twitter.sdk", "Twitter Kit", "SOCIAL_NETWORK_SERVICE"),
    ("com.mapbox", "Mapbox", "NAVIGATION"),
];

impl Taxonomy {
    /// The built-in catalog
    pub fn standard() -> Taxonomy {
        Self::standard_builder()
            .build()
            .expect("standard catalog has unique names")
    }

    /// Builder preloaded with the built-in catalog, for extension
    pub fn standard_builder() -> TaxonomyBuilder {
        let mut builder = TaxonomyBuilder::new();
        for &(name, display, sensitivity, tier) in PERMISSIONS {
            builder = builder.permission(PermissionKind::new(name, display, sensitivity, tier));
        }
        for &(name, description) in PURPOSES {
            builder = builder.purpose(Purpose::new(name, description));
        }
        for &(id, display, purpose) in VENDORS {
            builder = builder.library(ThirdPartyLibrary::vendor(id, display, purpose));
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::LibraryCategory;

    #[test]
    fn standard_catalog_builds() {
        let taxonomy = Taxonomy::standard();
        assert_eq!(taxonomy.permissions().len(), PERMISSIONS.len());
        // wildcard + listed purposes
        assert_eq!(taxonomy.purposes().len(), PURPOSES.len() + 1);
        // wildcard + two category markers + vendors
        assert_eq!(taxonomy.libraries().len(), VENDORS.len() + 3);
    }

    #[test]
    fn ad_sdk_wins_over_broader_vendor_prefix() {
        let taxonomy = Taxonomy::standard();
        let lib = taxonomy
            .lookup_by_code_origin("com.facebook.ads.internal.AdLoader")
            .unwrap();
        assert_eq!(lib.id(), "com.facebook.ads");
        assert_eq!(lib.default_purpose(), "DISPLAY_ADVERTISEMENT");
    }

    #[test]
    fn category_libraries_are_registered() {
        let taxonomy = Taxonomy::standard();
        assert_eq!(
            taxonomy.category_library(LibraryCategory::ThirdParty).id(),
            "THIRD_PARTY_USE"
        );
        assert!(taxonomy.all_library().is_all());
    }
}
