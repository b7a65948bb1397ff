//! Decides whether a static type is an auto-converting wrapper

use crate::semantic::{Ty, TypeDescriptor};

/// A wrapper type and the type it implicitly converts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperInfo {
    /// Simple name of the wrapper type (e.g. `NetInt`)
    pub wrapper_name: String,
    /// Simple name of the conversion target (e.g. `Int32`)
    pub target_name: String,
}

/// Classify a type as a wrapper when it (or a base type, after substitution)
/// declares exactly one implicit conversion to some other type.
///
/// A nullable wrapper (`W?`, e.g. the result of `item?.field` on a struct
/// wrapper) classifies as `W`, since the lifted conversion still applies.
pub fn classify(ty: TypeDescriptor<'_>) -> Option<WrapperInfo> {
    let subject = ty.ty();
    match subject {
        Ty::Nullable(inner) => return classify(TypeDescriptor::new(ty.table(), inner)),
        Ty::Named { .. } => {}
        _ => return None,
    }

    let mut targets: Vec<Ty> = Vec::new();
    for conversion in ty.implicit_conversions() {
        if &conversion.target == subject || conversion.target == conversion.declared_in {
            continue;
        }
        if !targets.contains(&conversion.target) {
            targets.push(conversion.target);
        }
    }

    match targets.as_slice() {
        [target] => Some(WrapperInfo {
            wrapper_name: ty.name(),
            target_name: ty.table().name_of(target),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{bind, SemanticModel};
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;

    fn model(src: &str) -> SemanticModel {
        let unit = crate::syntax::parse(&SourceText::new(src)).unwrap();
        bind(&unit)
    }

    fn classify_named(model: &SemanticModel, name: &str) -> Option<WrapperInfo> {
        let def = model.table().find(name, 0, None)?;
        let ty = Ty::Named {
            def,
            args: Vec::new(),
        };
        classify(model.describe(&ty))
    }

    const NETCODE: &str = "
        namespace Netcode {
            public class NetInt : NetFieldBase<int, NetInt> { }
            public class NetRef : NetFieldBase<object, NetRef> { }
            public class NetString : NetInt { }
            public class NetFieldBase<T, TSelf> where TSelf : NetFieldBase<T, TSelf> {
                public T Value { get; set; }
                public static implicit operator T(NetFieldBase<T, TSelf> field) => field.Value;
            }
        }";

    #[test]
    fn test_generic_base_conversion() {
        let model = model(NETCODE);
        assert_eq!(
            classify_named(&model, "NetInt"),
            Some(WrapperInfo {
                wrapper_name: "NetInt".to_string(),
                target_name: "Int32".to_string(),
            })
        );
        assert_eq!(
            classify_named(&model, "NetRef").map(|w| w.target_name),
            Some("Object".to_string())
        );
        // inherited through two levels
        assert_eq!(
            classify_named(&model, "NetString").map(|w| w.wrapper_name),
            Some("NetString".to_string())
        );
    }

    #[test]
    fn test_primitives_and_null_are_not_wrappers() {
        let model = model(NETCODE);
        for ty in [Ty::Primitive("Int32"), Ty::Null, Ty::Primitive("Object")] {
            assert_eq!(classify(model.describe(&ty)), None);
        }
    }

    #[test]
    fn test_explicit_and_self_conversions_are_ignored() {
        let model = model(
            "class Money {
                 public static explicit operator int(Money m) => 0;
                 public static implicit operator Money(int v) => null;
             }",
        );
        assert_eq!(classify_named(&model, "Money"), None);
    }

    #[test]
    fn test_ambiguous_conversions() {
        let model = model(
            "class Both {
                 public static implicit operator int(Both b) => 0;
                 public static implicit operator string(Both b) => null;
             }
             class Twice {
                 public static implicit operator int(Twice t) => 0;
                 public static implicit operator int(Twice t) => 1;
             }",
        );
        assert_eq!(classify_named(&model, "Both"), None);
        // the same target twice is still a single conversion
        assert_eq!(
            classify_named(&model, "Twice").map(|w| w.target_name),
            Some("Int32".to_string())
        );
    }

    #[test]
    fn test_nullable_struct_wrapper_keeps_wrapper_name() {
        let model = model(
            "public struct NetInt {
                 public int Value;
                 public static implicit operator int(NetInt field) => field.Value;
             }",
        );
        let def = model.table().find("NetInt", 0, None).unwrap();
        let lifted = Ty::Nullable(Box::new(Ty::Named {
            def,
            args: Vec::new(),
        }));
        assert_eq!(
            classify(model.describe(&lifted)),
            Some(WrapperInfo {
                wrapper_name: "NetInt".to_string(),
                target_name: "Int32".to_string(),
            })
        );
        let nullable_int = Ty::Nullable(Box::new(Ty::Primitive("Int32")));
        assert_eq!(classify(model.describe(&nullable_int)), None);
    }

    #[test]
    fn test_plain_class_is_not_a_wrapper() {
        let model = model("class Item { public int x; }");
        assert_eq!(classify_named(&model, "Item"), None);
    }
}
