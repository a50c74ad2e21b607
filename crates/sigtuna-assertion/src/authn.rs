#![forbid(unsafe_code)]

//! The authentication context of an assertion.
//!
//! Modeled as a single tagged union with at most one active
//! declaration payload, which makes the Decl/DeclRef exclusivity
//! invariant a property of the type plus one guard at mutation time.

use sigtuna_core::Error;

/// How the subject authenticated.
///
/// Exactly one shape is active: a bare class reference, an inline
/// declaration, or a reference to a declaration.  A class reference may
/// accompany either declaration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthnContext {
    /// `<saml:AuthnContextClassRef>` only.
    ClassRef(String),
    /// `<saml:AuthnContextDecl>` (inline declaration, verbatim XML),
    /// optionally with a class reference.
    Decl {
        class_ref: Option<String>,
        decl: String,
    },
    /// `<saml:AuthnContextDeclRef>`, optionally with a class reference.
    DeclRef {
        class_ref: Option<String>,
        decl_ref: String,
    },
}

impl AuthnContext {
    /// Assemble an AuthnContext from parsed parts, enforcing both
    /// invariants: Decl and DeclRef are mutually exclusive, and at least
    /// one of the three must be present.
    pub fn from_parts(
        class_ref: Option<String>,
        decl: Option<String>,
        decl_ref: Option<String>,
    ) -> Result<Self, Error> {
        match (class_ref, decl, decl_ref) {
            (_, Some(_), Some(_)) => Err(Error::AuthnContextConstraint(
                "AuthnContextDecl and AuthnContextDeclRef are mutually exclusive".into(),
            )),
            (class_ref, Some(decl), None) => Ok(Self::Decl { class_ref, decl }),
            (class_ref, None, Some(decl_ref)) => Ok(Self::DeclRef {
                class_ref,
                decl_ref,
            }),
            (Some(class_ref), None, None) => Ok(Self::ClassRef(class_ref)),
            (None, None, None) => Err(Error::AuthnContextConstraint(
                "one of AuthnContextClassRef, AuthnContextDecl or AuthnContextDeclRef is required"
                    .into(),
            )),
        }
    }

    /// The class reference, if present.
    pub fn class_ref(&self) -> Option<&str> {
        match self {
            Self::ClassRef(c) => Some(c),
            Self::Decl { class_ref, .. } | Self::DeclRef { class_ref, .. } => {
                class_ref.as_deref()
            }
        }
    }

    /// The inline declaration XML, if present.
    pub fn decl(&self) -> Option<&str> {
        match self {
            Self::Decl { decl, .. } => Some(decl),
            _ => None,
        }
    }

    /// The declaration reference, if present.
    pub fn decl_ref(&self) -> Option<&str> {
        match self {
            Self::DeclRef { decl_ref, .. } => Some(decl_ref),
            _ => None,
        }
    }

    pub(crate) fn into_class_ref(self) -> Option<String> {
        match self {
            Self::ClassRef(c) => Some(c),
            Self::Decl { class_ref, .. } | Self::DeclRef { class_ref, .. } => class_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_and_decl_ref_are_mutually_exclusive() {
        let err = AuthnContext::from_parts(
            None,
            Some("<x/>".into()),
            Some("ref".into()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AuthnContextConstraint(_)));
    }

    #[test]
    fn at_least_one_variant_is_required() {
        assert!(matches!(
            AuthnContext::from_parts(None, None, None),
            Err(Error::AuthnContextConstraint(_))
        ));
    }

    #[test]
    fn decl_ref_never_populates_class_ref() {
        let ctx = AuthnContext::from_parts(None, None, Some("relative/url".into())).unwrap();
        assert_eq!(ctx.class_ref(), None);
        assert_eq!(ctx.decl_ref(), Some("relative/url"));
    }

    #[test]
    fn class_ref_accompanies_either_declaration_form() {
        let ctx =
            AuthnContext::from_parts(Some("c".into()), Some("<x/>".into()), None).unwrap();
        assert_eq!(ctx.class_ref(), Some("c"));
        assert_eq!(ctx.decl(), Some("<x/>"));
        assert_eq!(ctx.decl_ref(), None);
    }
}
