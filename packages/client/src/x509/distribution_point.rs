//! DistributionPoint structures of the CRL Distribution Points extension

use der::asn1::BitString;
use der::{Any, Decode, Encode, Tag, Tagged};
use x509_cert::name::RelativeDistinguishedName;

use crate::asn1::{context_tag, decode_explicit, decode_implicit, decode_sequence, decode_tagged, encode_explicit, encode_implicit, encode_sequence, encode_tagged};
use crate::config::FormatLimits;
use crate::error::{DecodeError, DecodeResult};

use super::attributes::{bytes_to_string, Attributes, AttributesContent};
use super::bits::{named_bit_string, named_bits};
use super::general_names::GeneralNames;

/// Revocation reasons covered by a distribution point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReasonFlag {
    Unused,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl ReasonFlag {
    pub const ALL: [ReasonFlag; 9] = [
        ReasonFlag::Unused,
        ReasonFlag::KeyCompromise,
        ReasonFlag::CaCompromise,
        ReasonFlag::AffiliationChanged,
        ReasonFlag::Superseded,
        ReasonFlag::CessationOfOperation,
        ReasonFlag::CertificateHold,
        ReasonFlag::PrivilegeWithdrawn,
        ReasonFlag::AaCompromise,
    ];

    #[must_use]
    pub fn bit(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ReasonFlag::Unused => "unused",
            ReasonFlag::KeyCompromise => "keyCompromise",
            ReasonFlag::CaCompromise => "cACompromise",
            ReasonFlag::AffiliationChanged => "affiliationChanged",
            ReasonFlag::Superseded => "superseded",
            ReasonFlag::CessationOfOperation => "cessationOfOperation",
            ReasonFlag::CertificateHold => "certificateHold",
            ReasonFlag::PrivilegeWithdrawn => "privilegeWithdrawn",
            ReasonFlag::AaCompromise => "aACompromise",
        }
    }
}

/// `DistributionPointName ::= CHOICE { fullName [0], nameRelativeToCRLIssuer [1] }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionPointName {
    FullName(GeneralNames),
    /// Raw content of the relative name SET, kept as is.
    RelativeName(Vec<u8>),
}

impl DistributionPointName {
    pub fn decode(any: &Any) -> DecodeResult<Self> {
        match context_tag(any) {
            Some(0) => GeneralNames::decode_implicit(any, 0)
                .map(DistributionPointName::FullName)
                .map_err(|e| e.within("fullName")),
            Some(1) => {
                let tagged = decode_tagged(any, 1)?;
                Ok(DistributionPointName::RelativeName(tagged.value().to_vec()))
            }
            _ => Err(DecodeError::unexpected_tag("", "[0] or [1]", any.tag())),
        }
    }

    pub fn encode(&self) -> DecodeResult<Any> {
        match self {
            DistributionPointName::FullName(names) => names.encode_implicit(0),
            DistributionPointName::RelativeName(content) => encode_tagged(1, true, content),
        }
    }

    /// Display value; relative names render as an RDN when they parse.
    #[must_use]
    pub fn to_value_string(&self, limits: &FormatLimits) -> String {
        match self {
            DistributionPointName::FullName(names) => names.to_value_string(limits.long),
            DistributionPointName::RelativeName(content) => relative_name_string(content)
                .unwrap_or_else(|| bytes_to_string(content, limits.short)),
        }
    }
}

fn relative_name_string(content: &[u8]) -> Option<String> {
    let set = Any::new(Tag::Set, content.to_vec()).ok()?;
    let rdn = RelativeDistinguishedName::from_der(&set.to_der().ok()?).ok()?;

    Some(rdn.to_string())
}

/// ```text
/// DistributionPoint ::= SEQUENCE {
///      distributionPoint       [0]     DistributionPointName OPTIONAL,
///      reasons                 [1]     ReasonFlags OPTIONAL,
///      cRLIssuer               [2]     GeneralNames OPTIONAL }
/// ```
///
/// Decoding does not require either the name or the CRL issuer to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionPoint {
    pub name: Option<DistributionPointName>,
    pub reasons: Option<Vec<ReasonFlag>>,
    pub crl_issuer: Option<GeneralNames>,
}

impl DistributionPoint {
    #[must_use]
    pub fn with_name(name: DistributionPointName) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn decode(any: &Any) -> DecodeResult<Self> {
        let elements = decode_sequence(any, 0, 3)?;
        let mut point = DistributionPoint::default();
        let mut last_tag = None;

        for element in &elements {
            let tag = context_tag(element);

            if tag.is_none() || tag <= last_tag {
                return Err(DecodeError::unexpected_tag("", "[0], [1] or [2] in order", element.tag()));
            }
            last_tag = tag;

            match tag {
                Some(0) => {
                    let inner = decode_explicit(element, 0).map_err(|e| e.within("distributionPoint"))?;
                    point.name =
                        Some(DistributionPointName::decode(&inner).map_err(|e| e.within("distributionPoint"))?);
                }
                Some(1) => {
                    let bits: BitString =
                        decode_implicit(element, 1, Tag::BitString).map_err(|e| e.within("reasons"))?;
                    point.reasons = Some(named_bits(&bits, &ReasonFlag::ALL).map_err(|e| e.within("reasons"))?);
                }
                Some(2) => {
                    point.crl_issuer =
                        Some(GeneralNames::decode_implicit(element, 2).map_err(|e| e.within("cRLIssuer"))?);
                }
                _ => {
                    return Err(DecodeError::unexpected_tag("", "[0], [1] or [2]", element.tag()));
                }
            }
        }
        Ok(point)
    }

    pub fn encode(&self) -> DecodeResult<Any> {
        let mut elements = Vec::new();

        if let Some(name) = &self.name {
            elements.push(encode_explicit(0, &name.encode()?)?);
        }
        if let Some(reasons) = &self.reasons {
            let bits = named_bit_string(reasons.iter().map(|reason| reason.bit()))?;
            elements.push(encode_implicit(1, &bits)?);
        }
        if let Some(issuer) = &self.crl_issuer {
            elements.push(issuer.encode_implicit(2)?);
        }
        encode_sequence(&elements)
    }

    #[must_use]
    pub fn to_value_string(&self, limits: &FormatLimits) -> String {
        match (&self.name, &self.crl_issuer) {
            (Some(name), _) => name.to_value_string(limits),
            (None, Some(issuer)) => issuer.to_value_string(limits.long),
            (None, None) => String::new(),
        }
    }
}

impl AttributesContent for DistributionPoint {
    fn add_to_attributes(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        match &self.name {
            Some(DistributionPointName::FullName(names)) => {
                attributes.add_content("Full name", names, limits);
            }
            Some(relative @ DistributionPointName::RelativeName(_)) => {
                attributes.add("Relative name", Some(relative.to_value_string(limits)));
            }
            None => {}
        }
        if let Some(reasons) = &self.reasons {
            let labels = reasons.iter().map(|reason| reason.label()).collect::<Vec<_>>();
            attributes.add("Reasons", Some(labels.join(", ")));
        }
        if let Some(issuer) = &self.crl_issuer {
            attributes.add_content("CRL issuer", issuer, limits);
        }
    }
}
