#![forbid(unsafe_code)]

//! SAML 2.0 assertion model: parsing, structural validation,
//! serialization, enveloped signing/verification, and attribute
//! encryption/decryption.

pub mod assertion;
pub mod authn;
pub mod value;

pub use assertion::{Assertion, Attribute, NameId};
pub use authn::AuthnContext;
pub use value::AttributeValue;

#[cfg(test)]
mod tests {
    use super::*;
    use sigtuna_core::{algorithm, Error};
    use sigtuna_keys::{Key, KeyData, KeyUsage};

    fn rsa_keypair() -> (Key, Key) {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = private.to_public_key();
        (
            Key::new(
                KeyData::Rsa {
                    private: None,
                    public: public.clone(),
                },
                KeyUsage::Verify,
            ),
            Key::new(
                KeyData::Rsa {
                    private: Some(private),
                    public,
                },
                KeyUsage::Any,
            ),
        )
    }

    const BASIC: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z"
>
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:Conditions>
    <saml:AudienceRestriction>
      <saml:Audience>audience1</saml:Audience>
      <saml:Audience>audience2</saml:Audience>
    </saml:AudienceRestriction>
  </saml:Conditions>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthnContextClassRef>someAuthnContext</saml:AuthnContextClassRef>
      <saml:AuthenticatingAuthority>someIdP1</saml:AuthenticatingAuthority>
      <saml:AuthenticatingAuthority>someIdP2</saml:AuthenticatingAuthority>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;

    const TYPED_ATTRIBUTES: &str = r#"<saml:Assertion
        xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        Version="2.0"
        ID="_93af655219464fb403b34436cfb0c5cb1d9a5502"
        IssueInstant="1970-01-01T01:33:31Z">
  <saml:Issuer>Provider</saml:Issuer>
  <saml:Conditions/>
  <saml:AttributeStatement>
    <saml:Attribute Name="urn:some:string">
        <saml:AttributeValue xsi:type="xs:string">string</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="urn:some:integer">
        <saml:AttributeValue xsi:type="xs:integer">42</saml:AttributeValue>
    </saml:Attribute>
  </saml:AttributeStatement>
</saml:Assertion>"#;

    const COMPLEX_ATTRIBUTES: &str = r#"<saml:Assertion
        xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        Version="2.0"
        ID="_93af655219464fb403b34436cfb0c5cb1d9a5502"
        IssueInstant="1970-01-01T01:33:31Z">
  <saml:Issuer>Provider</saml:Issuer>
  <saml:Conditions/>
  <saml:AttributeStatement>
    <saml:Attribute Name="urn:mace:dir:attribute-def:eduPersonTargetedID" NameFormat="urn:oasis:names:tc:SAML:2.0:attrname-format:uri">
        <saml:AttributeValue>
            <saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">abcd-some-value-xyz</saml:NameID>
        </saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="urn:EntityConcernedSubID" NameFormat="urn:oasis:names:tc:SAML:2.0:attrname-format:uri">
        <saml:AttributeValue xsi:type="xs:string">string</saml:AttributeValue>
    </saml:Attribute>
  </saml:AttributeStatement>
</saml:Assertion>"#;

    // ── Building and parsing ─────────────────────────────────────────

    #[test]
    fn building_a_basic_assertion() {
        let mut assertion = Assertion::new();
        assertion.set_issuer("testIssuer");
        assertion.set_valid_audiences(vec!["audience1".into(), "audience2".into()]);
        assertion.set_authn_context_class_ref("someAuthnContext");

        let xml = assertion.to_xml().unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();

        let issuers: Vec<_> = root
            .children()
            .filter(|n| n.has_tag_name((sigtuna_core::ns::SAML, "Issuer")))
            .collect();
        assert_eq!(issuers.len(), 1);
        assert_eq!(issuers[0].text(), Some("testIssuer"));

        let audiences: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name((sigtuna_core::ns::SAML, "Audience")))
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(audiences, vec!["audience1", "audience2"]);

        let class_refs: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name((sigtuna_core::ns::SAML, "AuthnContextClassRef")))
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(class_refs, vec!["someAuthnContext"]);
    }

    #[test]
    fn parsing_a_basic_assertion() {
        let assertion = Assertion::from_xml(BASIC).unwrap();
        assert_eq!(assertion.id(), "_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf");
        assert_eq!(assertion.issuer(), "testIssuer");
        assert_eq!(assertion.valid_audiences(), ["audience1", "audience2"]);
        assert_eq!(
            assertion.authenticating_authorities(),
            ["someIdP1", "someIdP2"]
        );
        assert_eq!(assertion.authn_context_class_ref(), Some("someAuthnContext"));
    }

    #[test]
    fn authn_context_decl_and_class_ref() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthnContextClassRef>someAuthnContext</saml:AuthnContextClassRef>
      <saml:AuthnContextDecl>
        <samlac:AuthenticationContextDeclaration xmlns:samlac="urn:oasis:names:tc:SAML:2.0:ac">
        </samlac:AuthenticationContextDeclaration>
      </saml:AuthnContextDecl>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;
        let assertion = Assertion::from_xml(xml).unwrap();
        let decl = assertion.authn_context_decl().unwrap();
        assert!(decl.contains("AuthenticationContextDeclaration"));
        assert_eq!(assertion.authn_context_class_ref(), Some("someAuthnContext"));
        assert_eq!(assertion.authn_context_decl_ref(), None);
    }

    #[test]
    fn authn_context_decl_ref_and_class_ref() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthnContextClassRef>someAuthnContext</saml:AuthnContextClassRef>
      <saml:AuthnContextDeclRef>/relative/path/to/document.xml</saml:AuthnContextDeclRef>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;
        let assertion = Assertion::from_xml(xml).unwrap();
        assert_eq!(
            assertion.authn_context_decl_ref(),
            Some("/relative/path/to/document.xml")
        );
        assert_eq!(assertion.authn_context_class_ref(), Some("someAuthnContext"));
    }

    #[test]
    fn decl_and_decl_ref_constraint_on_setters() {
        let decl = "<samlac:AuthenticationContextDeclaration xmlns:samlac=\"urn:oasis:names:tc:SAML:2.0:ac\"></samlac:AuthenticationContextDeclaration>";

        let mut assertion = Assertion::new();
        assertion.set_authn_context_decl(decl).unwrap();
        assert!(matches!(
            assertion.set_authn_context_decl_ref("/relative/path/to/document.xml"),
            Err(Error::AuthnContextConstraint(_))
        ));

        // And in reverse order.
        let mut assertion = Assertion::new();
        assertion
            .set_authn_context_decl_ref("/relative/path/to/document.xml")
            .unwrap();
        assert!(matches!(
            assertion.set_authn_context_decl(decl),
            Err(Error::AuthnContextConstraint(_))
        ));
    }

    #[test]
    fn decl_and_decl_ref_constraint_on_parse() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthnContextDecl>
        <samlac:AuthenticationContextDeclaration xmlns:samlac="urn:oasis:names:tc:SAML:2.0:ac">
        </samlac:AuthenticationContextDeclaration>
      </saml:AuthnContextDecl>
      <saml:AuthnContextDeclRef>/relative/path/to/document.xml</saml:AuthnContextDeclRef>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;
        assert!(matches!(
            Assertion::from_xml(xml),
            Err(Error::AuthnContextConstraint(_))
        ));
    }

    #[test]
    fn authn_context_must_have_class_ref_or_decl_or_decl_ref() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthenticatingAuthority>someIdP1</saml:AuthenticatingAuthority>
      <saml:AuthenticatingAuthority>someIdP2</saml:AuthenticatingAuthority>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;
        assert!(matches!(
            Assertion::from_xml(xml),
            Err(Error::AuthnContextConstraint(_))
        ));
    }

    #[test]
    fn decl_ref_is_not_mistaken_for_class_ref() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf"
                Version="2.0"
                IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>testIssuer</saml:Issuer>
  <saml:AuthnStatement AuthnInstant="2010-03-05T13:34:28Z">
    <saml:AuthnContext>
      <saml:AuthnContextDeclRef>relative/url/to/authcontext.xml</saml:AuthnContextDeclRef>
    </saml:AuthnContext>
  </saml:AuthnStatement>
</saml:Assertion>"#;
        let assertion = Assertion::from_xml(xml).unwrap();
        assert_eq!(assertion.authn_context_class_ref(), None);
        assert_eq!(
            assertion.authn_context_decl_ref(),
            Some("relative/url/to/authcontext.xml")
        );
    }

    // ── Structural failures ──────────────────────────────────────────

    #[test]
    fn version_other_than_two_zero_is_rejected() {
        let xml = BASIC.replace("Version=\"2.0\"", "Version=\"1.3\"");
        match Assertion::from_xml(&xml) {
            Err(Error::UnsupportedVersion(v)) => assert_eq!(v, "1.3"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn missing_id_is_rejected() {
        let xml = BASIC.replace("ID=\"_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf\"", "");
        assert!(matches!(Assertion::from_xml(&xml), Err(Error::MissingId)));
    }

    #[test]
    fn missing_issuer_is_rejected() {
        let xml = BASIC.replace("<saml:Issuer>testIssuer</saml:Issuer>", "");
        assert!(matches!(
            Assertion::from_xml(&xml),
            Err(Error::MissingIssuer)
        ));
    }

    // ── Attribute decoding ───────────────────────────────────────────

    #[test]
    fn typed_attribute_values_are_decoded() {
        let assertion = Assertion::from_xml(TYPED_ATTRIBUTES).unwrap();
        assert_eq!(
            assertion.attribute("urn:some:integer").unwrap().values,
            [AttributeValue::Integer(42)]
        );
        assert_eq!(
            assertion.attribute("urn:some:string").unwrap().values,
            [AttributeValue::String {
                value: "string".into(),
                typed: true
            }]
        );
    }

    #[test]
    fn typed_attribute_values_survive_a_roundtrip() {
        let assertion = Assertion::from_xml(TYPED_ATTRIBUTES).unwrap();
        let reparsed = Assertion::from_xml(&assertion.to_xml().unwrap()).unwrap();
        assert_eq!(assertion.attributes(), reparsed.attributes());
        assert_eq!(reparsed.issuer(), "Provider");
    }

    #[test]
    fn complex_attribute_values_stay_structural() {
        let assertion = Assertion::from_xml(COMPLEX_ATTRIBUTES).unwrap();
        let targeted_id = assertion
            .attribute("urn:mace:dir:attribute-def:eduPersonTargetedID")
            .unwrap();
        let fragment = targeted_id.values[0].as_fragment().unwrap();
        assert!(fragment.starts_with("<saml:NameID"));
        assert!(fragment.contains("abcd-some-value-xyz"));
        assert_eq!(
            targeted_id.name_format.as_deref(),
            Some("urn:oasis:names:tc:SAML:2.0:attrname-format:uri")
        );

        let reparsed = Assertion::from_xml(&assertion.to_xml().unwrap()).unwrap();
        assert_eq!(assertion.attributes(), reparsed.attributes());
    }

    #[test]
    fn same_named_attributes_merge_in_document_order() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        Version="2.0" ID="_merge" IssueInstant="2010-03-05T13:34:28Z">
  <saml:Issuer>Provider</saml:Issuer>
  <saml:AttributeStatement>
    <saml:Attribute Name="urn:dup">
      <saml:AttributeValue>first</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="urn:other">
      <saml:AttributeValue>middle</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="urn:dup">
      <saml:AttributeValue>second</saml:AttributeValue>
    </saml:Attribute>
  </saml:AttributeStatement>
</saml:Assertion>"#;
        let assertion = Assertion::from_xml(xml).unwrap();
        let attributes = assertion.attributes();
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            assertion.attribute("urn:dup").unwrap().values,
            [
                AttributeValue::string("first"),
                AttributeValue::string("second")
            ]
        );
    }

    // ── Encrypted attributes ─────────────────────────────────────────

    #[test]
    fn parsed_encrypted_attributes_are_detected() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        Version="2.0" ID="_93af655219464fb403b34436cfb0c5cb1d9a5502" IssueInstant="1970-01-01T01:33:31Z">
  <saml:Issuer>Provider</saml:Issuer>
  <saml:AttributeStatement>
    <saml:Attribute Name="urn:ServiceID">
      <saml:AttributeValue xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="xs:string">1</saml:AttributeValue>
    </saml:Attribute>
    <saml:EncryptedAttribute>
      <xenc:EncryptedData xmlns:xenc="http://www.w3.org/2001/04/xmlenc#" Type="http://www.w3.org/2001/04/xmlenc#Element">
        <xenc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>
        <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
          <xenc:EncryptedKey>
            <xenc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p"/>
            <xenc:CipherData><xenc:CipherValue>S0lEUw==</xenc:CipherValue></xenc:CipherData>
          </xenc:EncryptedKey>
        </ds:KeyInfo>
        <xenc:CipherData><xenc:CipherValue>Q0lQSEVS</xenc:CipherValue></xenc:CipherData>
      </xenc:EncryptedData>
    </saml:EncryptedAttribute>
  </saml:AttributeStatement>
</saml:Assertion>"#;
        let assertion = Assertion::from_xml(xml).unwrap();
        assert!(assertion.has_encrypted_attributes());
        // The plain attribute is visible without any key material.
        assert_eq!(assertion.attributes().len(), 1);

        // Re-serialization carries the ciphertext block through untouched.
        let reparsed = Assertion::from_xml(&assertion.to_xml().unwrap()).unwrap();
        assert!(reparsed.has_encrypted_attributes());
    }

    #[test]
    fn typed_encrypted_attribute_values_roundtrip() {
        let (public_key, private_key) = rsa_keypair();

        let mut assertion = Assertion::from_xml(TYPED_ATTRIBUTES).unwrap();
        assertion.set_encryption_key(public_key);
        assertion.set_encrypted_attributes(true);
        let encrypted_xml = assertion.to_xml().unwrap();
        assert!(encrypted_xml.contains("EncryptedAttribute"));
        assert!(!encrypted_xml.contains("urn:some:integer"));

        let mut decrypted = Assertion::from_xml(&encrypted_xml).unwrap();
        assert!(decrypted.has_encrypted_attributes());
        assert!(decrypted.attributes().is_empty());

        decrypted.decrypt_attributes(&private_key).unwrap();
        assert_eq!(
            decrypted.attribute("urn:some:integer").unwrap().values,
            [AttributeValue::Integer(42)]
        );
        assert_eq!(
            decrypted.attribute("urn:some:string").unwrap().values,
            [AttributeValue::String {
                value: "string".into(),
                typed: true
            }]
        );

        // Decrypting again is a no-op.
        decrypted.decrypt_attributes(&private_key).unwrap();
        assert_eq!(decrypted.attributes().len(), 2);
    }

    #[test]
    fn complex_encrypted_attribute_values_roundtrip() {
        let (public_key, private_key) = rsa_keypair();

        let original = Assertion::from_xml(COMPLEX_ATTRIBUTES).unwrap();
        let mut assertion = Assertion::from_xml(COMPLEX_ATTRIBUTES).unwrap();
        assertion.set_encryption_key(public_key);
        assertion.set_encrypted_attributes(true);
        let encrypted_xml = assertion.to_xml().unwrap();

        let mut decrypted = Assertion::from_xml(&encrypted_xml).unwrap();
        assert!(decrypted.has_encrypted_attributes());
        decrypted.decrypt_attributes(&private_key).unwrap();
        assert_eq!(original.attributes(), decrypted.attributes());
    }

    #[test]
    fn decrypting_with_the_wrong_key_fails() {
        let (public_key, _) = rsa_keypair();
        let (_, wrong_private) = rsa_keypair();

        let mut assertion = Assertion::from_xml(TYPED_ATTRIBUTES).unwrap();
        assertion.set_encryption_key(public_key);
        assertion.set_encrypted_attributes(true);
        let encrypted_xml = assertion.to_xml().unwrap();

        let mut parsed = Assertion::from_xml(&encrypted_xml).unwrap();
        assert!(matches!(
            parsed.decrypt_attributes(&wrong_private),
            Err(Error::Decryption(_))
        ));
    }

    // ── Signature lifecycle ──────────────────────────────────────────

    #[test]
    fn signature_method_can_be_extracted_after_signing() {
        let (_, private_key) = rsa_keypair();
        let cert_body = "TUlJQ2dUQ0NBZW1nQXdJQkFnSUJBREA=".to_owned();

        let mut assertion = Assertion::from_xml(TYPED_ATTRIBUTES).unwrap();
        assertion.set_signing_key(private_key);
        assertion.set_certificates(vec![cert_body.clone()]);
        let signed_xml = assertion.to_xml().unwrap();

        let signed = Assertion::from_xml(&signed_xml).unwrap();
        assert_eq!(signed.signature_method(), Some(algorithm::RSA_SHA256));
        assert_eq!(signed.certificates(), [cert_body]);
        assert_eq!(signed.issuer(), "Provider");
    }

    #[test]
    fn validating_a_signed_assertion() {
        let (public_key, private_key) = rsa_keypair();

        let mut assertion = Assertion::from_xml(BASIC).unwrap();
        assertion.set_signing_key(private_key);
        let signed_xml = assertion.to_xml().unwrap();

        let signed = Assertion::from_xml(&signed_xml).unwrap();
        assert!(signed.validate(&public_key).unwrap());
        assert_eq!(signed.id(), "_593e33ddf86449ce4d4c22b60ac48e067d98a0b2bf");
        assert_eq!(signed.issuer(), "testIssuer");
    }

    #[test]
    fn validating_with_the_wrong_key_fails() {
        let (_, private_key) = rsa_keypair();
        let (wrong_public, _) = rsa_keypair();

        let mut assertion = Assertion::from_xml(BASIC).unwrap();
        assertion.set_signing_key(private_key);
        let signed_xml = assertion.to_xml().unwrap();

        let signed = Assertion::from_xml(&signed_xml).unwrap();
        assert!(matches!(
            signed.validate(&wrong_public),
            Err(Error::SignatureValidation(_))
        ));
    }

    #[test]
    fn tampering_is_caught_at_construction() {
        let (_, private_key) = rsa_keypair();

        let mut assertion = Assertion::from_xml(BASIC).unwrap();
        assertion.set_signing_key(private_key);
        let signed_xml = assertion.to_xml().unwrap();

        let tampered = signed_xml.replace("testIssuer", "evilIssuer");
        assert_ne!(signed_xml, tampered);
        assert!(matches!(
            Assertion::from_xml(&tampered),
            Err(Error::ReferenceValidation(_))
        ));
    }

    #[test]
    fn validating_an_unsigned_assertion_returns_false() {
        let (public_key, _) = rsa_keypair();
        let assertion = Assertion::from_xml(BASIC).unwrap();
        assert_eq!(assertion.validate(&public_key).unwrap(), false);
    }

    // ── Full model roundtrip ─────────────────────────────────────────

    #[test]
    fn programmatic_assertion_roundtrips() {
        use chrono::TimeZone;

        let mut assertion = Assertion::new();
        // xsd:dateTime carries whole seconds; pin one for the comparison.
        assertion.set_issue_instant(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assertion.set_issuer("https://idp.example.org/metadata");
        assertion.set_name_id(NameId {
            value: "s00000000:123456789".into(),
            format: Some("urn:oasis:names:tc:SAML:2.0:nameid-format:persistent".into()),
        });
        assertion.set_valid_audiences(vec!["sp1".into(), "sp2".into()]);
        assertion
            .set_authn_context_decl_ref("relative/url/to/authcontext.xml")
            .unwrap();
        assertion.set_authn_context_class_ref("urn:oasis:names:tc:SAML:2.0:ac:classes:Password");
        assertion.set_session_index("_session1");
        assertion.set_authenticating_authorities(vec!["idp1".into(), "idp2".into()]);
        assertion.add_attribute(Attribute {
            name: "urn:mail".into(),
            name_format: None,
            values: vec![AttributeValue::string("user@example.org")],
        });

        let reparsed = Assertion::from_xml(&assertion.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed.id(), assertion.id());
        assert_eq!(reparsed.issuer(), assertion.issuer());
        assert_eq!(reparsed.name_id(), assertion.name_id());
        assert_eq!(reparsed.valid_audiences(), assertion.valid_audiences());
        assert_eq!(reparsed.authn_context(), assertion.authn_context());
        assert_eq!(reparsed.session_index(), assertion.session_index());
        assert_eq!(
            reparsed.authenticating_authorities(),
            assertion.authenticating_authorities()
        );
        assert_eq!(reparsed.attributes(), assertion.attributes());
        assert_eq!(reparsed.issue_instant(), assertion.issue_instant());
    }
}
