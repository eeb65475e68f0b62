use der::asn1::ObjectIdentifier;
use der::Any;

use crate::asn1::{decode_sequence, encode_sequence};
use crate::config::FormatLimits;
use crate::error::DecodeResult;
use crate::x509::attributes::{join_limited, Attributes, AttributesContent};
use crate::x509::distribution_point::DistributionPoint;

use super::ExtensionData;

/// `CRLDistributionPoints ::= SEQUENCE SIZE (1..MAX) OF DistributionPoint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlDistributionPointsExtensionData {
    critical: bool,
    points: Vec<DistributionPoint>,
}

impl CrlDistributionPointsExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.31");
    pub const NAME: &'static str = "CRLDistributionPoints";

    #[must_use]
    pub fn new(critical: bool, points: Vec<DistributionPoint>) -> Self {
        Self { critical, points }
    }

    #[must_use]
    pub fn points(&self) -> &[DistributionPoint] {
        &self.points
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let points = decode_sequence(any, 1, usize::MAX)?
            .iter()
            .enumerate()
            .map(|(index, element)| DistributionPoint::decode(element).map_err(|e| e.within(&format!("[{index}]"))))
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self { critical, points })
    }
}

impl ExtensionData for CrlDistributionPointsExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        let elements = self
            .points
            .iter()
            .map(DistributionPoint::encode)
            .collect::<DecodeResult<Vec<_>>>()?;
        encode_sequence(&elements)
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        join_limited(
            self.points.iter().map(|point| point.to_value_string(limits)),
            limits.long,
        )
    }

    fn add_details(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        for (index, point) in self.points.iter().enumerate() {
            let child = attributes.add(format!("Distribution point [{index}]"), None);
            point.add_to_attributes(child, limits);
        }
    }
}
