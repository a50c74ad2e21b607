#![forbid(unsafe_code)]

//! The SAML 2.0 assertion entity.
//!
//! An `Assertion` is created either by parsing an XML element — all
//! structural invariants are checked before the value is observable — or
//! by field-by-field construction for later serialization.  `id` and
//! `version` are fixed after creation; everything else has setters until
//! `to_xml` finalizes output.

use chrono::{DateTime, Utc};
use sigtuna_core::{ns, Error};
use sigtuna_dsig::SignatureBlock;
use sigtuna_keys::Key;
use sigtuna_xml::{find_child, find_children, parsing_options, XmlWriter};

use crate::authn::AuthnContext;
use crate::value::AttributeValue;

/// The subject `<saml:NameID>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    pub value: String,
    pub format: Option<String>,
}

/// A named attribute with its ordered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub name_format: Option<String>,
    pub values: Vec<AttributeValue>,
}

/// One position in the attribute statement: either a decoded attribute or
/// a not-yet-decrypted ciphertext block, in document order.
#[derive(Debug, Clone)]
enum AttributeSlot {
    Plain(Attribute),
    Encrypted(String),
}

/// A SAML 2.0 assertion.
#[derive(Debug)]
pub struct Assertion {
    id: String,
    version: String,
    issue_instant: DateTime<Utc>,
    issuer: String,
    name_id: Option<NameId>,
    not_before: Option<DateTime<Utc>>,
    not_on_or_after: Option<DateTime<Utc>>,
    valid_audiences: Vec<String>,
    authn_context: Option<AuthnContext>,
    authn_instant: Option<DateTime<Utc>>,
    session_index: Option<String>,
    authenticating_authorities: Vec<String>,
    attribute_slots: Vec<AttributeSlot>,
    encrypted_attributes: bool,
    signature: Option<SignatureBlock>,
    certificates: Vec<String>,
    signing_key: Option<Key>,
    encryption_key: Option<Key>,
}

impl Default for Assertion {
    fn default() -> Self {
        Self::new()
    }
}

impl Assertion {
    /// Create a fresh assertion with a generated ID and the current
    /// instant.
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            version: "2.0".to_owned(),
            issue_instant: Utc::now(),
            issuer: String::new(),
            name_id: None,
            not_before: None,
            not_on_or_after: None,
            valid_audiences: Vec::new(),
            authn_context: None,
            authn_instant: None,
            session_index: None,
            authenticating_authorities: Vec::new(),
            attribute_slots: Vec::new(),
            encrypted_attributes: false,
            signature: None,
            certificates: Vec::new(),
            signing_key: None,
            encryption_key: None,
        }
    }

    // ── Parsing ──────────────────────────────────────────────────────

    /// Parse an assertion from its serialized XML element.
    ///
    /// When a `<ds:Signature>` child is present, the reference digests are
    /// validated here; a mismatch aborts construction with
    /// [`Error::ReferenceValidation`].  Key-based verification stays
    /// behind [`Assertion::validate`].
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let doc = roxmltree::Document::parse_with_options(xml, parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != ns::node::ASSERTION
            || root.tag_name().namespace() != Some(ns::SAML)
        {
            return Err(Error::XmlStructure("expected a saml:Assertion element".into()));
        }

        let version = root.attribute(ns::attr::VERSION).unwrap_or("").to_owned();
        if version != "2.0" {
            return Err(Error::UnsupportedVersion(version));
        }

        let id = root
            .attribute(ns::attr::ID)
            .ok_or(Error::MissingId)?
            .to_owned();

        let issue_instant_raw = root
            .attribute(ns::attr::ISSUE_INSTANT)
            .ok_or_else(|| Error::MissingAttribute("IssueInstant".into()))?;
        let issue_instant = parse_instant(issue_instant_raw)?;

        let issuer = find_child(root, ns::SAML, ns::node::ISSUER)
            .ok_or(Error::MissingIssuer)?
            .text()
            .unwrap_or("")
            .trim()
            .to_owned();

        let mut assertion = Self {
            id,
            version,
            issue_instant,
            issuer,
            ..Self::new()
        };

        if let Some(subject) = find_child(root, ns::SAML, ns::node::SUBJECT) {
            if let Some(name_id) = find_child(subject, ns::SAML, ns::node::NAME_ID) {
                assertion.name_id = Some(NameId {
                    value: name_id.text().unwrap_or("").trim().to_owned(),
                    format: name_id.attribute(ns::attr::FORMAT).map(str::to_owned),
                });
            }
        }

        if let Some(conditions) = find_child(root, ns::SAML, ns::node::CONDITIONS) {
            if let Some(raw) = conditions.attribute(ns::attr::NOT_BEFORE) {
                assertion.not_before = Some(parse_instant(raw)?);
            }
            if let Some(raw) = conditions.attribute(ns::attr::NOT_ON_OR_AFTER) {
                assertion.not_on_or_after = Some(parse_instant(raw)?);
            }
            for restriction in
                find_children(conditions, ns::SAML, ns::node::AUDIENCE_RESTRICTION)
            {
                for audience in find_children(restriction, ns::SAML, ns::node::AUDIENCE) {
                    assertion
                        .valid_audiences
                        .push(audience.text().unwrap_or("").trim().to_owned());
                }
            }
        }

        if let Some(statement) = find_child(root, ns::SAML, ns::node::AUTHN_STATEMENT) {
            assertion.parse_authn_statement(statement, xml)?;
        }

        if let Some(statement) = find_child(root, ns::SAML, ns::node::ATTRIBUTE_STATEMENT) {
            assertion.parse_attribute_statement(statement, xml)?;
        }

        if find_child(root, ns::DSIG, ns::node::SIGNATURE).is_some() {
            // Tamper detection happens at construction time; it needs no
            // key material, only the embedded reference digests.
            sigtuna_dsig::verify_reference(xml)?;
            if let Some(block) = sigtuna_dsig::read_signature(xml)? {
                assertion.certificates = block.certificates.clone();
                assertion.signature = Some(block);
            }
        }

        Ok(assertion)
    }

    fn parse_authn_statement(
        &mut self,
        statement: roxmltree::Node<'_, '_>,
        source: &str,
    ) -> Result<(), Error> {
        if let Some(raw) = statement.attribute(ns::attr::AUTHN_INSTANT) {
            self.authn_instant = Some(parse_instant(raw)?);
        }
        self.session_index = statement
            .attribute(ns::attr::SESSION_INDEX)
            .map(str::to_owned);

        let context = find_child(statement, ns::SAML, ns::node::AUTHN_CONTEXT)
            .ok_or_else(|| Error::MissingElement("AuthnContext".into()))?;

        let class_ref = find_child(context, ns::SAML, ns::node::AUTHN_CONTEXT_CLASS_REF)
            .map(|n| n.text().unwrap_or("").trim().to_owned());
        let decl = find_child(context, ns::SAML, ns::node::AUTHN_CONTEXT_DECL)
            .map(|n| element_fragment(n, source));
        let decl_ref = find_child(context, ns::SAML, ns::node::AUTHN_CONTEXT_DECL_REF)
            .map(|n| n.text().unwrap_or("").trim().to_owned());

        self.authn_context = Some(AuthnContext::from_parts(class_ref, decl, decl_ref)?);

        for authority in
            find_children(context, ns::SAML, ns::node::AUTHENTICATING_AUTHORITY)
        {
            self.authenticating_authorities
                .push(authority.text().unwrap_or("").trim().to_owned());
        }
        Ok(())
    }

    fn parse_attribute_statement(
        &mut self,
        statement: roxmltree::Node<'_, '_>,
        source: &str,
    ) -> Result<(), Error> {
        for child in statement.children().filter(|c| c.is_element()) {
            let child_ns = child.tag_name().namespace().unwrap_or("");
            if child_ns != ns::SAML {
                continue;
            }
            match child.tag_name().name() {
                ns::node::ATTRIBUTE => {
                    let attribute = decode_attribute(child, source)?;
                    push_attribute(&mut self.attribute_slots, attribute);
                }
                ns::node::ENCRYPTED_ATTRIBUTE => {
                    let enc_data = find_child(child, ns::ENC, ns::node::ENCRYPTED_DATA)
                        .ok_or_else(|| {
                            Error::MissingElement("EncryptedData in EncryptedAttribute".into())
                        })?;
                    let raw = source[enc_data.range()].to_owned();
                    self.attribute_slots.push(AttributeSlot::Encrypted(raw));
                    self.encrypted_attributes = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Serialize this assertion to XML in schema child order.
    ///
    /// When an encryption key is set and the encrypted-attributes flag is
    /// on, plain attributes are emitted as `<saml:EncryptedAttribute>`
    /// blocks.  When a signing key is set, the enveloped signature is
    /// computed and embedded as the final step, so the digest covers the
    /// finished content.
    pub fn to_xml(&self) -> Result<String, Error> {
        let issue_instant = format_instant(self.issue_instant);
        let mut w = XmlWriter::new();
        w.start_element(
            "saml:Assertion",
            &[
                ("xmlns:saml", ns::SAML),
                (ns::attr::ID, &self.id),
                (ns::attr::VERSION, &self.version),
                (ns::attr::ISSUE_INSTANT, &issue_instant),
            ],
        );
        w.text_element("saml:Issuer", &[], &self.issuer);

        if let Some(name_id) = &self.name_id {
            w.start_element("saml:Subject", &[]);
            match &name_id.format {
                Some(format) => w.text_element(
                    "saml:NameID",
                    &[(ns::attr::FORMAT, format)],
                    &name_id.value,
                ),
                None => w.text_element("saml:NameID", &[], &name_id.value),
            }
            w.end_element("saml:Subject");
        }

        self.write_conditions(&mut w);
        self.write_authn_statement(&mut w, &issue_instant);
        self.write_attribute_statement(&mut w)?;

        w.end_element("saml:Assertion");
        let xml = w.into_string();

        match &self.signing_key {
            Some(key) => {
                sigtuna_dsig::sign_assertion(&xml, &self.id, key, &self.certificates)
            }
            None => Ok(xml),
        }
    }

    fn write_conditions(&self, w: &mut XmlWriter) {
        if self.not_before.is_none()
            && self.not_on_or_after.is_none()
            && self.valid_audiences.is_empty()
        {
            return;
        }
        let not_before = self.not_before.map(format_instant);
        let not_on_or_after = self.not_on_or_after.map(format_instant);
        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if let Some(value) = &not_before {
            attrs.push((ns::attr::NOT_BEFORE, value));
        }
        if let Some(value) = &not_on_or_after {
            attrs.push((ns::attr::NOT_ON_OR_AFTER, value));
        }
        w.start_element("saml:Conditions", &attrs);
        if !self.valid_audiences.is_empty() {
            w.start_element("saml:AudienceRestriction", &[]);
            for audience in &self.valid_audiences {
                w.text_element("saml:Audience", &[], audience);
            }
            w.end_element("saml:AudienceRestriction");
        }
        w.end_element("saml:Conditions");
    }

    fn write_authn_statement(&self, w: &mut XmlWriter, issue_instant: &str) {
        let Some(context) = &self.authn_context else {
            return;
        };
        let authn_instant = self.authn_instant.map(format_instant);
        let mut attrs: Vec<(&str, &str)> = vec![(
            ns::attr::AUTHN_INSTANT,
            authn_instant.as_deref().unwrap_or(issue_instant),
        )];
        if let Some(index) = &self.session_index {
            attrs.push((ns::attr::SESSION_INDEX, index));
        }
        w.start_element("saml:AuthnStatement", &attrs);
        w.start_element("saml:AuthnContext", &[]);
        if let Some(class_ref) = context.class_ref() {
            w.text_element("saml:AuthnContextClassRef", &[], class_ref);
        }
        if let Some(decl) = context.decl() {
            w.start_element("saml:AuthnContextDecl", &[]);
            w.raw(decl);
            w.end_element("saml:AuthnContextDecl");
        }
        if let Some(decl_ref) = context.decl_ref() {
            w.text_element("saml:AuthnContextDeclRef", &[], decl_ref);
        }
        for authority in &self.authenticating_authorities {
            w.text_element("saml:AuthenticatingAuthority", &[], authority);
        }
        w.end_element("saml:AuthnContext");
        w.end_element("saml:AuthnStatement");
    }

    fn write_attribute_statement(&self, w: &mut XmlWriter) -> Result<(), Error> {
        if self.attribute_slots.is_empty() {
            return Ok(());
        }
        let encrypting = self.encrypted_attributes && self.encryption_key.is_some();
        w.start_element("saml:AttributeStatement", &[]);
        for slot in &self.attribute_slots {
            match slot {
                AttributeSlot::Plain(attribute) => {
                    if encrypting {
                        let key = self.encryption_key.as_ref().unwrap();
                        let plain = serialize_attribute(attribute, true);
                        let encrypted = sigtuna_enc::encrypt_element(&plain, key)?;
                        w.start_element("saml:EncryptedAttribute", &[]);
                        w.raw(&encrypted);
                        w.end_element("saml:EncryptedAttribute");
                    } else {
                        w.raw(&serialize_attribute(attribute, false));
                    }
                }
                AttributeSlot::Encrypted(raw) => {
                    w.start_element("saml:EncryptedAttribute", &[]);
                    w.raw(raw);
                    w.end_element("saml:EncryptedAttribute");
                }
            }
        }
        w.end_element("saml:AttributeStatement");
        Ok(())
    }

    // ── Signature ────────────────────────────────────────────────────

    /// Check the assertion's signature against `key`.
    ///
    /// Returns `Ok(false)` when the assertion carries no signature at all
    /// — absence is "unsigned", not a failure.  A present signature that
    /// does not verify raises [`Error::SignatureValidation`].
    pub fn validate(&self, key: &Key) -> Result<bool, Error> {
        match &self.signature {
            None => Ok(false),
            Some(block) => {
                sigtuna_dsig::verify_signature(block, key)?;
                Ok(true)
            }
        }
    }

    /// The signature method URI: the verified method after parsing a
    /// signed assertion, or the intended method when a signing key is set.
    pub fn signature_method(&self) -> Option<&str> {
        self.signature
            .as_ref()
            .map(|block| block.algorithm.as_str())
            .or_else(|| self.signing_key.as_ref().map(|k| k.signature_algorithm()))
    }

    /// Certificates embedded in the signature key-info, in order
    /// (base64 DER bodies).
    pub fn certificates(&self) -> &[String] {
        &self.certificates
    }

    /// Set the certificates to embed when signing.
    pub fn set_certificates(&mut self, certificates: Vec<String>) {
        self.certificates = certificates;
    }

    /// Set the signing key; `to_xml` embeds an enveloped signature.
    pub fn set_signing_key(&mut self, key: Key) {
        self.signing_key = Some(key);
    }

    // ── Encrypted attributes ─────────────────────────────────────────

    /// Whether this assertion carries (or is flagged to produce)
    /// encrypted attributes.
    pub fn has_encrypted_attributes(&self) -> bool {
        self.encrypted_attributes
    }

    /// Flag the attribute statement for encryption on serialization
    /// (requires an encryption key to take effect).
    pub fn set_encrypted_attributes(&mut self, encrypted: bool) {
        self.encrypted_attributes = encrypted;
    }

    /// Set the recipient key used to encrypt attributes on serialization.
    pub fn set_encryption_key(&mut self, key: Key) {
        self.encryption_key = Some(key);
    }

    /// Decrypt every stashed attribute ciphertext block with `key` and
    /// merge the recovered attributes in original document order.
    /// A no-op when nothing is stashed.
    pub fn decrypt_attributes(&mut self, key: &Key) -> Result<(), Error> {
        for i in 0..self.attribute_slots.len() {
            let raw = match &self.attribute_slots[i] {
                AttributeSlot::Encrypted(raw) => raw.clone(),
                AttributeSlot::Plain(_) => continue,
            };
            let plain = sigtuna_enc::decrypt_element(&raw, key)?;
            let attribute = parse_standalone_attribute(&plain)?;
            self.attribute_slots[i] = AttributeSlot::Plain(attribute);
        }
        self.merge_plain_slots();
        Ok(())
    }

    /// Collapse plain slots sharing a name into the first occurrence,
    /// preserving value order.
    fn merge_plain_slots(&mut self) {
        let mut i = 0;
        while i < self.attribute_slots.len() {
            let name = match &self.attribute_slots[i] {
                AttributeSlot::Plain(a) => a.name.clone(),
                AttributeSlot::Encrypted(_) => {
                    i += 1;
                    continue;
                }
            };
            let mut j = i + 1;
            while j < self.attribute_slots.len() {
                let same_name = matches!(
                    &self.attribute_slots[j],
                    AttributeSlot::Plain(a) if a.name == name
                );
                if same_name {
                    if let AttributeSlot::Plain(later) = self.attribute_slots.remove(j) {
                        if let AttributeSlot::Plain(first) = &mut self.attribute_slots[i] {
                            first.values.extend(later.values);
                        }
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    // ── Field access ─────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.issue_instant
    }

    pub fn set_issue_instant(&mut self, instant: DateTime<Utc>) {
        self.issue_instant = instant;
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn set_issuer(&mut self, issuer: impl Into<String>) {
        self.issuer = issuer.into();
    }

    pub fn name_id(&self) -> Option<&NameId> {
        self.name_id.as_ref()
    }

    pub fn set_name_id(&mut self, name_id: NameId) {
        self.name_id = Some(name_id);
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    pub fn set_not_before(&mut self, instant: Option<DateTime<Utc>>) {
        self.not_before = instant;
    }

    pub fn not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.not_on_or_after
    }

    pub fn set_not_on_or_after(&mut self, instant: Option<DateTime<Utc>>) {
        self.not_on_or_after = instant;
    }

    pub fn valid_audiences(&self) -> &[String] {
        &self.valid_audiences
    }

    pub fn set_valid_audiences(&mut self, audiences: Vec<String>) {
        self.valid_audiences = audiences;
    }

    pub fn authn_instant(&self) -> Option<DateTime<Utc>> {
        self.authn_instant
    }

    pub fn set_authn_instant(&mut self, instant: DateTime<Utc>) {
        self.authn_instant = Some(instant);
    }

    pub fn session_index(&self) -> Option<&str> {
        self.session_index.as_deref()
    }

    pub fn set_session_index(&mut self, index: impl Into<String>) {
        self.session_index = Some(index.into());
    }

    pub fn authenticating_authorities(&self) -> &[String] {
        &self.authenticating_authorities
    }

    pub fn set_authenticating_authorities(&mut self, authorities: Vec<String>) {
        self.authenticating_authorities = authorities;
    }

    // ── AuthnContext ─────────────────────────────────────────────────

    pub fn authn_context(&self) -> Option<&AuthnContext> {
        self.authn_context.as_ref()
    }

    pub fn authn_context_class_ref(&self) -> Option<&str> {
        self.authn_context.as_ref().and_then(AuthnContext::class_ref)
    }

    pub fn authn_context_decl(&self) -> Option<&str> {
        self.authn_context.as_ref().and_then(AuthnContext::decl)
    }

    pub fn authn_context_decl_ref(&self) -> Option<&str> {
        self.authn_context.as_ref().and_then(AuthnContext::decl_ref)
    }

    /// Set the class reference, keeping any declaration payload.
    pub fn set_authn_context_class_ref(&mut self, class_ref: impl Into<String>) {
        let class_ref = class_ref.into();
        self.authn_context = Some(match self.authn_context.take() {
            None | Some(AuthnContext::ClassRef(_)) => AuthnContext::ClassRef(class_ref),
            Some(AuthnContext::Decl { decl, .. }) => AuthnContext::Decl {
                class_ref: Some(class_ref),
                decl,
            },
            Some(AuthnContext::DeclRef { decl_ref, .. }) => AuthnContext::DeclRef {
                class_ref: Some(class_ref),
                decl_ref,
            },
        });
    }

    /// Set an inline declaration.  Fails if a declaration reference is
    /// already set: Decl and DeclRef are mutually exclusive.
    pub fn set_authn_context_decl(&mut self, decl: impl Into<String>) -> Result<(), Error> {
        if matches!(self.authn_context, Some(AuthnContext::DeclRef { .. })) {
            return Err(Error::AuthnContextConstraint(
                "AuthnContextDeclRef is already set; AuthnContextDecl cannot coexist with it"
                    .into(),
            ));
        }
        let class_ref = self.authn_context.take().and_then(AuthnContext::into_class_ref);
        self.authn_context = Some(AuthnContext::Decl {
            class_ref,
            decl: decl.into(),
        });
        Ok(())
    }

    /// Set a declaration reference.  Fails if an inline declaration is
    /// already set: Decl and DeclRef are mutually exclusive.
    pub fn set_authn_context_decl_ref(
        &mut self,
        decl_ref: impl Into<String>,
    ) -> Result<(), Error> {
        if matches!(self.authn_context, Some(AuthnContext::Decl { .. })) {
            return Err(Error::AuthnContextConstraint(
                "AuthnContextDecl is already set; AuthnContextDeclRef cannot coexist with it"
                    .into(),
            ));
        }
        let class_ref = self.authn_context.take().and_then(AuthnContext::into_class_ref);
        self.authn_context = Some(AuthnContext::DeclRef {
            class_ref,
            decl_ref: decl_ref.into(),
        });
        Ok(())
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// The decoded attributes, in document order.
    pub fn attributes(&self) -> Vec<&Attribute> {
        self.attribute_slots
            .iter()
            .filter_map(|slot| match slot {
                AttributeSlot::Plain(a) => Some(a),
                AttributeSlot::Encrypted(_) => None,
            })
            .collect()
    }

    /// Look up a decoded attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().into_iter().find(|a| a.name == name)
    }

    /// Append an attribute; values of an existing name merge in order.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        push_attribute(&mut self.attribute_slots, attribute);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn decode_attribute(
    node: roxmltree::Node<'_, '_>,
    source: &str,
) -> Result<Attribute, Error> {
    let name = node
        .attribute(ns::attr::NAME)
        .ok_or_else(|| Error::MissingAttribute("Name on Attribute".into()))?
        .to_owned();
    let name_format = node.attribute(ns::attr::NAME_FORMAT).map(str::to_owned);
    let mut values = Vec::new();
    for value in find_children(node, ns::SAML, ns::node::ATTRIBUTE_VALUE) {
        values.push(AttributeValue::decode(value, source)?);
    }
    Ok(Attribute {
        name,
        name_format,
        values,
    })
}

fn push_attribute(slots: &mut Vec<AttributeSlot>, attribute: Attribute) {
    for slot in slots.iter_mut() {
        if let AttributeSlot::Plain(existing) = slot {
            if existing.name == attribute.name {
                existing.values.extend(attribute.values);
                return;
            }
        }
    }
    slots.push(AttributeSlot::Plain(attribute));
}

/// Serialize an attribute element; `standalone` declares the saml prefix
/// so the element survives outside its document (for encryption).
fn serialize_attribute(attribute: &Attribute, standalone: bool) -> String {
    let mut w = XmlWriter::new();
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if standalone {
        attrs.push(("xmlns:saml", ns::SAML));
    }
    attrs.push((ns::attr::NAME, &attribute.name));
    if let Some(format) = &attribute.name_format {
        attrs.push((ns::attr::NAME_FORMAT, format));
    }
    w.start_element("saml:Attribute", &attrs);
    for value in &attribute.values {
        value.write(&mut w);
    }
    w.end_element("saml:Attribute");
    w.into_string()
}

fn parse_standalone_attribute(xml: &str) -> Result<Attribute, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, parsing_options())
        .map_err(|e| Error::Decryption(format!("decrypted attribute is not valid XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != ns::node::ATTRIBUTE
        || root.tag_name().namespace() != Some(ns::SAML)
    {
        return Err(Error::Decryption(
            "decrypted content is not a saml:Attribute".into(),
        ));
    }
    decode_attribute(root, xml)
}

/// Verbatim inner XML of an element: its child elements sliced from the
/// source, or the text content when there are none.
fn element_fragment(node: roxmltree::Node<'_, '_>, source: &str) -> String {
    let elements: Vec<roxmltree::Node<'_, '_>> =
        node.children().filter(|c| c.is_element()).collect();
    if elements.is_empty() {
        node.text().unwrap_or("").trim().to_owned()
    } else {
        let start = elements[0].range().start;
        let end = elements[elements.len() - 1].range().end;
        source[start..end].to_owned()
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("invalid xsd:dateTime {raw:?}: {e}")))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Generate an assertion ID: an underscore followed by 40 hex characters.
fn generate_id() -> String {
    use rand::RngCore;
    use std::fmt::Write;

    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut id = String::with_capacity(41);
    id.push('_');
    for byte in bytes {
        let _ = write!(id, "{byte:02x}");
    }
    id
}
