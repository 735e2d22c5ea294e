//! Decision properties of threshold classification.

use mysql_query_check::{classify, Classification, Thresholds};

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn above_critical_is_critical() {
    assert_eq!(
        classify(15., "value > 5", "value > 10"),
        Classification::Critical
    );
}

#[test]
fn between_thresholds_is_warning() {
    assert_eq!(
        classify(7., "value > 5", "value > 10"),
        Classification::Warning
    );
}

#[test]
fn below_both_is_ok() {
    assert_eq!(classify(3., "value > 5", "value > 10"), Classification::Ok);
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

/// Critical wins whenever it holds, whatever warning says.
#[test]
fn critical_dominates_warning() {
    let pairs = [
        ("value > 0", "value > 10"),
        ("value < 0", "value > 10"),
        ("value > 10", "value > 10"),
        ("", "value > 10"),
    ];
    for v in [11., 50., 1e12] {
        for (w, c) in pairs {
            assert_eq!(classify(v, w, c), Classification::Critical, "{v} {w:?} {c:?}");
        }
    }
}

#[test]
fn warning_applies_only_when_critical_fails() {
    for v in [-3., 0., 4.5, 10.] {
        assert_eq!(
            classify(v, "value <= 10", "value > 10"),
            Classification::Warning,
            "{v}"
        );
    }
}

#[test]
fn empty_expressions_never_escalate() {
    for v in [f64::MIN, -1., 0., 1., f64::MAX, f64::INFINITY] {
        assert_eq!(classify(v, "", ""), Classification::Ok);
        assert_eq!(classify(v, "  ", "\t"), Classification::Ok);
    }
}

#[test]
fn range_expressions() {
    let w = "value >= 10 && value < 20";
    let c = "value >= 20 or value < 0";
    assert_eq!(classify(5., w, c), Classification::Ok);
    assert_eq!(classify(10., w, c), Classification::Warning);
    assert_eq!(classify(19.99, w, c), Classification::Warning);
    assert_eq!(classify(20., w, c), Classification::Critical);
    assert_eq!(classify(-0.5, w, c), Classification::Critical);
}

// ---------------------------------------------------------------------------
// Safety
// ---------------------------------------------------------------------------

/// A broken threshold must never mask a real problem as OK.
#[test]
fn malformed_expressions_are_unknown() {
    let broken = [
        "value >",
        "value > > 5",
        "> 5",
        "value => 5",
        "value > 5 &&",
        "(value > 5",
        "value > 5)",
        "val > 5",
        "value",
        "1 < value < 5",
        "value > 5; drop table t",
    ];
    for b in broken {
        assert_eq!(classify(3., b, "value > 10"), Classification::Unknown, "{b:?}");
        assert_eq!(classify(3., "value > 5", b), Classification::Unknown, "{b:?}");
    }
}

/// Both expressions are checked up front, so a bad warning is reported even
/// when critical would have fired.
#[test]
fn malformed_warning_is_unknown_even_if_critical_holds() {
    assert_eq!(
        classify(50., "value >>", "value > 10"),
        Classification::Unknown
    );
}

#[test]
fn nan_falls_through_to_ok() {
    assert_eq!(
        classify(f64::NAN, "value > 1", "value > 10"),
        Classification::Ok
    );
    assert_eq!(
        classify(f64::NAN, "value != 1", "value == value"),
        Classification::Ok
    );
}

#[test]
fn infinities_compare_normally() {
    assert_eq!(
        classify(f64::INFINITY, "value > 5", "value > 10"),
        Classification::Critical
    );
    assert_eq!(
        classify(f64::NEG_INFINITY, "value > 5", "value < 0"),
        Classification::Critical
    );
}

// ---------------------------------------------------------------------------
// Purity
// ---------------------------------------------------------------------------

#[test]
fn classification_is_repeatable() {
    let t = Thresholds::parse(Some("value > 5"), Some("value > 10")).unwrap();
    for v in [3., 7., 15., f64::NAN] {
        let first = t.classify(v);
        for _ in 0..10 {
            assert_eq!(t.classify(v), first);
            assert_eq!(classify(v, "value > 5", "value > 10"), first);
        }
    }
}
