use iobj_compiler::parse;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn numeric_literal_forms() {
    let document = parse("{int: 42, neg: -7, frac: 3.25, sci: 6e2, hex: 0x1F, oct: 0o17, bin: 0b101}");
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(
        document.to_json(),
        json!({
            "int": 42.0,
            "neg": -7.0,
            "frac": 3.25,
            "sci": 600.0,
            "hex": 31.0,
            "oct": 15.0,
            "bin": 5.0,
        })
    );
}

#[test]
fn big_integers_and_decimals() {
    let big = "9".repeat(30);
    let document = parse(&format!("{{big: {big}n, small: 7n, price: 1.50m}}"));
    assert!(!document.has_errors(), "{}", document.format_errors());
    let json = document.to_json();
    assert_eq!(json["big"], json!(big));
    assert_eq!(json["small"], json!(7));
    assert_eq!(json["price"], json!(1.5));
}

#[test]
fn non_finite_numbers_flatten_to_null() {
    let document = parse("{a: Inf, b: -Inf, c: NaN}");
    assert!(!document.has_errors());
    assert_eq!(document.to_json(), json!({"a": null, "b": null, "c": null}));
}

#[test]
fn string_forms() {
    let document = parse("{q: \"a\\nb\", r: 'it''s', open:  spaced  out  }");
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(
        document.to_json(),
        json!({"q": "a\nb", "r": "it's", "open": "spaced  out"})
    );
}

#[test]
fn boolean_and_null_markers() {
    let document = parse("{a: T, b: true, c: F, d: false, e: N, f: null}");
    assert!(!document.has_errors());
    assert_eq!(
        document.to_json(),
        json!({"a": true, "b": true, "c": false, "d": false, "e": null, "f": null})
    );
}

#[test]
fn date_time_values_format_per_variant() {
    let document = parse("{when: dt'2023-04-05T10:30Z', day: d'2023-04-05', at: t'10:30'}");
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(
        document.to_json(),
        json!({
            "when": "2023-04-05T10:30:00+00:00",
            "day": "2023-04-05",
            "at": "10:30:00",
        })
    );
}

#[test]
fn binary_values_round_trip_as_base64() {
    let document = parse("{avatar: b\"aGVsbG8=\"}");
    assert!(!document.has_errors(), "{}", document.format_errors());
    assert_eq!(document.to_json(), json!({"avatar": "aGVsbG8="}));
}

#[test]
fn positional_section_bodies_become_arrays() {
    let document = parse("--- \n1, 2, 3");
    assert!(!document.has_errors());
    assert_eq!(document.to_json(), json!([1.0, 2.0, 3.0]));
}

#[test]
fn serde_serialization_matches_to_json() {
    let document = parse("{name: John, scores: [1, 2], meta: {ok: true}}");
    assert!(!document.has_errors());
    let via_serde =
        serde_json::to_value(&document.sections[0].value).expect("value serializes");
    assert_eq!(via_serde, document.to_json());
}
