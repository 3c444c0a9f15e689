use std::cmp::Ordering;

use airbridge_types::{ProtocolVersionRange, Version};
use proptest::prelude::*;

fn version() -> impl Strategy<Value = (u32, u32, u32)> {
    (0_u32..40, 0_u32..40, 0_u32..40)
}

proptest! {
    #[test]
    fn ordering_is_numeric((a1, a2, a3) in version(), (b1, b2, b3) in version()) {
        let a = Version::parse(&format!("{a1}.{a2}.{a3}")).expect("generated version must parse");
        let b = Version::parse(&format!("{b1}.{b2}.{b3}")).expect("generated version must parse");
        prop_assert_eq!(a.version_compare_to(&b), (a1, a2, a3).cmp(&(b1, b2, b3)));
        prop_assert_eq!(a.version_compare_to(&b), b.version_compare_to(&a).reverse());
        prop_assert_eq!(a.compatible_version_compare_to(&b), (a1, a2).cmp(&(b1, b2)));
    }

    #[test]
    fn suffix_is_ignored((a1, a2, a3) in version(), suffix in "[a-z]{1,8}") {
        let plain = Version::new(a1, a2, a3);
        let suffixed = Version::parse(&format!("{a1}.{a2}.{a3}-{suffix}")).expect("suffixed version must parse");
        prop_assert_eq!(plain.version_compare_to(&suffixed), Ordering::Equal);
    }

    #[test]
    fn dev_short_circuits((a1, a2, a3) in version()) {
        let dev = Version::parse("dev").expect("dev must parse");
        let other = Version::new(a1, a2, a3);
        prop_assert_eq!(dev.version_compare_to(&other), Ordering::Equal);
        prop_assert_eq!(other.version_compare_to(&dev), Ordering::Equal);
        prop_assert_eq!(dev.compatible_version_compare_to(&other), Ordering::Equal);
        prop_assert_eq!(other.compatible_version_compare_to(&dev), Ordering::Equal);
        prop_assert!(Version::is_compatible(&dev, &other));
    }

    #[test]
    fn range_checks_major_only(min in 0_u32..5, span in 0_u32..5, (v1, v2, v3) in version()) {
        let range = ProtocolVersionRange::new(Version::new(min, 9, 9), Version::new(min + span, 0, 0));
        let candidate = Version::new(v1, v2, v3);
        prop_assert_eq!(range.is_supported(&candidate), min <= v1 && v1 <= min + span);
        prop_assert!(range.is_supported(&Version::parse("dev").expect("dev must parse")));
    }
}

#[test]
fn numeric_not_lexicographic() {
    let eleven = Version::parse("11.0.0").unwrap();
    let three = Version::parse("3.0.0").unwrap();
    assert!(eleven.greater_than(&three));
}
