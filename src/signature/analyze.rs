//! Signature analysis
//!
//! Turns a handler's declared parameters into the ordered argument
//! specifications a parser is synthesized from.

use crate::error::{SignatureError, SignatureResult};
use crate::signature::types::{
    Annotation, ArgKind, ArgumentSpec, Param, ParamType, Signature, Value, ValueType,
};
use std::collections::HashSet;

/// Analyze a signature into argument specifications, in declaration order
pub fn analyze(signature: &Signature) -> SignatureResult<Vec<ArgumentSpec>> {
    if signature.markers.len() > 1 {
        return Err(SignatureError::DuplicateMarker);
    }
    let marker = signature
        .markers
        .first()
        .copied()
        .unwrap_or(signature.params.len());

    let mut names = HashSet::new();
    let mut flags = HashSet::new();
    let mut first_defaulted: Option<&str> = None;
    let mut specs = Vec::with_capacity(signature.params.len());

    for (index, param) in signature.params.iter().enumerate() {
        if param.name.is_empty() {
            return Err(SignatureError::EmptyName);
        }
        if !names.insert(param.name.as_str()) {
            return Err(SignatureError::DuplicateParameter(param.name.clone()));
        }

        let keyword_only = index >= marker;
        if !keyword_only {
            match (param.default.is_some(), first_defaulted) {
                (true, None) => first_defaulted = Some(param.name.as_str()),
                (false, Some(after)) => {
                    return Err(SignatureError::RequiredAfterOptional {
                        param: param.name.clone(),
                        after: after.to_string(),
                    })
                }
                _ => {}
            }
        }

        let spec = analyze_param(param, keyword_only)?;
        for flag in &spec.flags {
            if !flags.insert(flag.clone()) {
                return Err(SignatureError::DuplicateFlag(flag.clone()));
            }
        }
        specs.push(spec);
    }

    Ok(specs)
}

/// Analyze a single parameter
fn analyze_param(param: &Param, keyword_only: bool) -> SignatureResult<ArgumentSpec> {
    let annotation = param.annotation.as_ref();
    let ty = annotation
        .and_then(|a| a.ty.clone())
        .unwrap_or_else(|| param.ty.clone());
    let (value_type, literal_choices) = resolve_type(&param.name, &ty)?;

    let explicit_flags = annotation.map(|a| a.flags.clone()).unwrap_or_default();
    for flag in &explicit_flags {
        validate_flag(&param.name, flag)?;
    }

    let has_default = param.default.is_some();
    if !keyword_only && !has_default && !explicit_flags.is_empty() {
        return Err(SignatureError::FlagOnPositional {
            param: param.name.clone(),
            flags: explicit_flags,
        });
    }

    let is_bool = value_type == ValueType::Bool && !matches!(ty, ParamType::Literal(_));
    let kind = if is_bool && (keyword_only || has_default) {
        ArgKind::BoolFlag
    } else if keyword_only || !explicit_flags.is_empty() {
        ArgKind::Optional
    } else {
        ArgKind::Positional
    };

    let mut choices = annotation
        .and_then(|a| a.choices.clone())
        .or(literal_choices)
        .map(|values| values.into_iter().map(|v| widen(v, value_type)).collect::<Vec<_>>());
    let help_text = annotation
        .and_then(|a| a.help.clone())
        .or_else(|| param.help.clone());
    let metavar = annotation.and_then(|a: &Annotation| a.metavar.clone());

    let flags = match kind {
        ArgKind::Positional => Vec::new(),
        _ if !explicit_flags.is_empty() => explicit_flags,
        _ => vec![derive_flag(&param.name)],
    };

    let default = match kind {
        ArgKind::BoolFlag => {
            if let Some(values) = choices.take() {
                if values.iter().any(|v| v.value_type() != Some(ValueType::Bool)) {
                    return Err(SignatureError::BoolFlagChoices(param.name.clone()));
                }
            }
            match &param.default {
                None => Some(Value::Bool(false)),
                Some(Value::Bool(b)) => Some(Value::Bool(*b)),
                Some(_) => {
                    return Err(SignatureError::DefaultTypeMismatch {
                        param: param.name.clone(),
                        expected: ValueType::Bool,
                    })
                }
            }
        }
        _ => check_default(param, value_type, choices.as_deref())?,
    };

    Ok(ArgumentSpec {
        identifier: param.name.clone(),
        kind,
        value_type,
        default,
        required: kind != ArgKind::BoolFlag && !has_default,
        flags,
        choices,
        help_text,
        metavar,
    })
}

/// Resolve the value type and, for literal types, the choice set
fn resolve_type(name: &str, ty: &ParamType) -> SignatureResult<(ValueType, Option<Vec<Value>>)> {
    let value_type = match ty {
        ParamType::Str => ValueType::Str,
        ParamType::Int => ValueType::Int,
        ParamType::Float => ValueType::Float,
        ParamType::Bool => ValueType::Bool,
        ParamType::Literal(members) => {
            let common = common_type(name, members)?;
            let members = members.iter().map(|m| widen(m.clone(), common)).collect();
            return Ok((common, Some(members)));
        }
    };
    Ok((value_type, None))
}

/// The shared type of a literal's members; integers widen to floats when mixed
fn common_type(name: &str, members: &[Value]) -> SignatureResult<ValueType> {
    let mut types = members.iter().map(Value::value_type);
    let first = match types.next() {
        None => return Err(SignatureError::EmptyLiteral(name.to_string())),
        Some(None) => return Err(SignatureError::MixedLiteral(name.to_string())),
        Some(Some(t)) => t,
    };

    types.try_fold(first, |acc, next| match (acc, next) {
        (acc, Some(t)) if acc == t => Ok(acc),
        (ValueType::Int, Some(ValueType::Float)) | (ValueType::Float, Some(ValueType::Int)) => {
            Ok(ValueType::Float)
        }
        _ => Err(SignatureError::MixedLiteral(name.to_string())),
    })
}

/// Integers become floats where a float is expected; anything else is unchanged
fn widen(value: Value, value_type: ValueType) -> Value {
    match (value, value_type) {
        (Value::Int(i), ValueType::Float) => Value::Float(i as f64),
        (value, _) => value,
    }
}

/// Check a non-flag default against the parameter's type and choices
fn check_default(
    param: &Param,
    value_type: ValueType,
    choices: Option<&[Value]>,
) -> SignatureResult<Option<Value>> {
    let default = match &param.default {
        None | Some(Value::None) => return Ok(param.default.clone()),
        Some(default) => default,
    };

    let default = match widen(default.clone(), value_type) {
        d if d.value_type() == Some(value_type) => d,
        _ => {
            return Err(SignatureError::DefaultTypeMismatch {
                param: param.name.clone(),
                expected: value_type,
            })
        }
    };

    if let Some(choices) = choices {
        if !choices.contains(&default) {
            return Err(SignatureError::DefaultNotInChoices(param.name.clone()));
        }
    }

    Ok(Some(default))
}

/// Derive a long flag from a parameter name: `dry_run` -> `--dry-run`
pub fn derive_flag(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

/// Flags are `-x` or `--long-name`
fn validate_flag(param: &str, flag: &str) -> SignatureResult<()> {
    let invalid = || SignatureError::InvalidFlag {
        param: param.to_string(),
        flag: flag.to_string(),
    };

    if flag.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if let Some(long) = flag.strip_prefix("--") {
        if long.is_empty() || long.starts_with('-') {
            return Err(invalid());
        }
        return Ok(());
    }
    match flag.strip_prefix('-') {
        Some(short) if short.chars().count() == 1 && short != "-" => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_signature() -> Signature {
        Signature::new()
            .positional("x", ParamType::Float)
            .positional("y", ParamType::Float)
            .keyword("verbose", ParamType::Bool, false)
    }

    #[test]
    fn test_positional_and_keyword_classification() {
        let specs = analyze(&add_signature()).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].kind, ArgKind::Positional);
        assert!(specs[0].required);
        assert!(specs[0].flags.is_empty());
        assert_eq!(specs[1].identifier, "y");
        assert_eq!(specs[2].kind, ArgKind::BoolFlag);
        assert_eq!(specs[2].flags, vec!["--verbose"]);
        assert_eq!(specs[2].default, Some(Value::Bool(false)));
    }

    #[test]
    fn test_positional_default_is_optional() {
        let sig = Signature::new().param(Param::new("topic", ParamType::Str).default(""));
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].kind, ArgKind::Positional);
        assert!(!specs[0].required);
        assert_eq!(specs[0].default, Some(Value::from("")));
    }

    #[test]
    fn test_derived_flag_uses_hyphens() {
        let sig = Signature::new().keyword("dry_run", ParamType::Bool, true);
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].flags, vec!["--dry-run"]);
        assert_eq!(specs[0].default, Some(Value::Bool(true)));
    }

    #[test]
    fn test_keyword_without_default_is_required_option() {
        let sig = Signature::new()
            .keyword_only()
            .param(Param::new("host", ParamType::Str));
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].kind, ArgKind::Optional);
        assert!(specs[0].required);
    }

    #[test]
    fn test_literal_produces_choices() {
        let sig = Signature::new().keyword(
            "level",
            ParamType::literal(["low", "high"]),
            "low",
        );
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].value_type, ValueType::Str);
        assert_eq!(
            specs[0].choices,
            Some(vec![Value::from("low"), Value::from("high")])
        );
    }

    #[test]
    fn test_literal_numeric_members_widen() {
        let sig = Signature::new().positional(
            "ratio",
            ParamType::Literal(vec![Value::Int(1), Value::Float(0.5)]),
        );
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].value_type, ValueType::Float);
        assert_eq!(specs[0].choices, Some(vec![Value::Float(1.0), Value::Float(0.5)]));

        // An integer default matches its widened member
        let sig = Signature::new().keyword(
            "ratio",
            ParamType::Literal(vec![Value::Int(1), Value::Float(0.5)]),
            1i64,
        );
        assert_eq!(analyze(&sig).unwrap()[0].default, Some(Value::Float(1.0)));
    }

    #[test]
    fn test_mixed_literal_rejected() {
        let sig = Signature::new().positional(
            "x",
            ParamType::Literal(vec![Value::Int(1), Value::from("one")]),
        );
        assert_eq!(
            analyze(&sig).unwrap_err(),
            SignatureError::MixedLiteral("x".to_string())
        );
        let empty = Signature::new().positional("x", ParamType::Literal(vec![]));
        assert_eq!(
            analyze(&empty).unwrap_err(),
            SignatureError::EmptyLiteral("x".to_string())
        );
    }

    #[test]
    fn test_annotation_overrides_flags_and_help() {
        let sig = Signature::new().keyword_only().param(
            Param::new("verbose", ParamType::Bool)
                .default(false)
                .help("inferred")
                .annotated(Annotation::new().flags(["-v", "--verbose"]).help("explicit")),
        );
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].flags, vec!["-v", "--verbose"]);
        assert_eq!(specs[0].help_text.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_annotation_type_override() {
        let sig = Signature::new().keyword_only().param(
            Param::new("count", ParamType::Str)
                .default(3i64)
                .annotated(Annotation::new().ty(ParamType::Int)),
        );
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].value_type, ValueType::Int);
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let sig = Signature::new()
            .param(Param::new("a", ParamType::Str).default("x"))
            .positional("b", ParamType::Str);
        assert_eq!(
            analyze(&sig).unwrap_err(),
            SignatureError::RequiredAfterOptional {
                param: "b".to_string(),
                after: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_bool_flag_with_non_bool_choices_rejected() {
        let sig = Signature::new().keyword_only().param(
            Param::new("force", ParamType::Bool)
                .default(false)
                .annotated(Annotation::new().choices(["yes", "no"])),
        );
        assert_eq!(
            analyze(&sig).unwrap_err(),
            SignatureError::BoolFlagChoices("force".to_string())
        );
    }

    #[test]
    fn test_flag_on_required_positional_rejected() {
        let sig = Signature::new().param(
            Param::new("path", ParamType::Str).annotated(Annotation::new().flags(["-p"])),
        );
        assert!(matches!(
            analyze(&sig).unwrap_err(),
            SignatureError::FlagOnPositional { .. }
        ));
    }

    #[test]
    fn test_flagged_positional_with_default_becomes_option() {
        let sig = Signature::new().param(
            Param::new("count", ParamType::Int)
                .default(1i64)
                .annotated(Annotation::new().flags(["-n", "--count"])),
        );
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].kind, ArgKind::Optional);
        assert!(!specs[0].required);
    }

    #[test]
    fn test_invalid_and_duplicate_flags() {
        let bad = Signature::new().keyword_only().param(
            Param::new("x", ParamType::Str)
                .default("")
                .annotated(Annotation::new().flags(["-xy"])),
        );
        assert!(matches!(
            analyze(&bad).unwrap_err(),
            SignatureError::InvalidFlag { .. }
        ));

        let dup = Signature::new()
            .keyword_only()
            .param(
                Param::new("a", ParamType::Bool)
                    .default(false)
                    .annotated(Annotation::new().flags(["-v"])),
            )
            .param(
                Param::new("b", ParamType::Bool)
                    .default(false)
                    .annotated(Annotation::new().flags(["-v"])),
            );
        assert_eq!(
            analyze(&dup).unwrap_err(),
            SignatureError::DuplicateFlag("-v".to_string())
        );
    }

    #[test]
    fn test_duplicate_parameter_and_marker() {
        let sig = Signature::new()
            .positional("x", ParamType::Int)
            .positional("x", ParamType::Int);
        assert_eq!(
            analyze(&sig).unwrap_err(),
            SignatureError::DuplicateParameter("x".to_string())
        );

        let markers = Signature::new().keyword_only().keyword_only();
        assert_eq!(analyze(&markers).unwrap_err(), SignatureError::DuplicateMarker);
    }

    #[test]
    fn test_default_checked_against_type_and_choices() {
        let wrong_type = Signature::new().keyword("n", ParamType::Int, "three");
        assert!(matches!(
            analyze(&wrong_type).unwrap_err(),
            SignatureError::DefaultTypeMismatch { .. }
        ));

        let outside = Signature::new().keyword("mode", ParamType::literal(["a", "b"]), "c");
        assert_eq!(
            analyze(&outside).unwrap_err(),
            SignatureError::DefaultNotInChoices("mode".to_string())
        );

        let widened = Signature::new().keyword("scale", ParamType::Float, 2i64);
        let specs = analyze(&widened).unwrap();
        assert_eq!(specs[0].default, Some(Value::Float(2.0)));
    }

    #[test]
    fn test_required_positional_bool_stays_positional() {
        let sig = Signature::new().positional("enabled", ParamType::Bool);
        let specs = analyze(&sig).unwrap();
        assert_eq!(specs[0].kind, ArgKind::Positional);
        assert_eq!(specs[0].value_type, ValueType::Bool);
    }
}
