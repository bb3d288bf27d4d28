//! Metadata summaries
//!
//! Flattens a metadata document into one row of commonly reviewed ISO-19139
//! fields, plus a few facts about the layer itself, for the summary report.
//! Fields are looked up with the standard ISO prefixes regardless of what
//! the document declares. A missing field is an empty string.

use crate::error::Result;
use crate::remote::Layer;
use crate::report::bool_cell;
use crate::xml::{ElementPath, MetadataDocument, NamespaceMap};
use std::collections::BTreeMap;
use std::path::Path;

/// One extracted field: its key, its report column header and where it lives
#[derive(Debug, Clone, Copy)]
pub struct SummaryField {
    pub key: &'static str,
    pub header: &'static str,
    pub path: &'static str,
}

const fn field(key: &'static str, header: &'static str, path: &'static str) -> SummaryField {
    SummaryField { key, header, path }
}

/// The ISO-19139 fields extracted into a summary, in report column order
pub const SUMMARY_FIELDS: &[SummaryField] = &[
    field("language", "Language", ".//gmd:language/gmd:LanguageCode"),
    field("hierarchyLevel", "Hierarchy Level", ".//gmd:hierarchyLevel/gmd:MD_ScopeCode"),
    field("hierarchyLevelName", "Hierarchy Level Name", ".//gmd:hierarchyLevelName/gco:CharacterString"),
    field("individualName", "Individual Name", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:individualName/gco:CharacterString"),
    field("organisationName", "Organisation Name", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:organisationName/gco:CharacterString"),
    field("positionName", "Position Name", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:positionName/gco:CharacterString"),
    field("phone", "Phone", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:phone/gmd:CI_Telephone/gmd:voice/gco:CharacterString"),
    field("email", "Email", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address/gmd:electronicMailAddress/gco:CharacterString"),
    field("address", "Address", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address/gmd:deliveryPoint/gco:CharacterString"),
    field("city", "City", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address/gmd:city/gco:CharacterString"),
    field("postalCode", "Postal Code", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address/gmd:postalCode/gco:CharacterString"),
    field("country", "Country", ".//gmd:contact/gmd:CI_ResponsibleParty/gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address/gmd:country/gmd:Country"),
    field("abstract", "Abstract", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:abstract/gco:CharacterString"),
    field("title", "Title", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:citation/gmd:CI_Citation/gmd:title/gco:CharacterString"),
    field("purpose", "Purpose", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:purpose/gco:CharacterString"),
    field("credit", "Credit", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:credit/gco:CharacterString"),
    field("status", "Status", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:status/gmd:MD_ProgressCode"),
    field("dateStamp", "Date Stamp", ".//gmd:dateStamp/gco:Date"),
    field("metadataStandardName", "Metadata Standard Name", ".//gmd:metadataStandardName/gco:CharacterString"),
    field("metadataStandardVersion", "Metadata Standard Version", ".//gmd:metadataStandardVersion/gco:CharacterString"),
    field("environmentDescription", "Environment Description", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:environmentDescription/gco:CharacterString"),
    field("topologyLevel", "Topology Level", ".//gmd:spatialRepresentationInfo/gmd:MD_VectorSpatialRepresentation/gmd:topologyLevel/gmd:MD_TopologyLevelCode"),
    field("geometricObjectType", "Geometric Object Type", ".//gmd:spatialRepresentationInfo/gmd:MD_VectorSpatialRepresentation/gmd:geometricObjects/gmd:MD_GeometricObjects/gmd:geometricObjectType/gmd:MD_GeometricObjectTypeCode"),
    field("geometricObjectCount", "Geometric Object Count", ".//gmd:spatialRepresentationInfo/gmd:MD_VectorSpatialRepresentation/gmd:geometricObjects/gmd:MD_GeometricObjects/gmd:geometricObjectCount/gco:Integer"),
    field("referenceSystemCode", "Reference System Code", ".//gmd:referenceSystemInfo/gmd:MD_ReferenceSystem/gmd:referenceSystemIdentifier/gmd:RS_Identifier/gmd:code/gco:CharacterString"),
    field("referenceSystemCodeSpace", "Reference System Code Space", ".//gmd:referenceSystemInfo/gmd:MD_ReferenceSystem/gmd:referenceSystemIdentifier/gmd:RS_Identifier/gmd:codeSpace/gco:CharacterString"),
    field("referenceSystemVersion", "Reference System Version", ".//gmd:referenceSystemInfo/gmd:MD_ReferenceSystem/gmd:referenceSystemIdentifier/gmd:RS_Identifier/gmd:version/gco:CharacterString"),
    field("keyword", "Keyword", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:descriptiveKeywords/gmd:MD_Keywords/gmd:keyword/gco:CharacterString"),
    field("useLimitation", "Use Limitation", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:resourceConstraints/gmd:MD_Constraints/gmd:useLimitation/gco:CharacterString"),
    field("spatialRepresentationType", "Spatial Representation Type", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:spatialRepresentationType/gmd:MD_SpatialRepresentationTypeCode"),
    field("distance", "Distance", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:spatialResolution/gmd:MD_Resolution/gmd:distance/gco:Distance"),
    field("characterSet", "Character Set", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:characterSet/gmd:MD_CharacterSetCode"),
    field("topicCategory", "Topic Category", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:topicCategory/gmd:MD_TopicCategoryCode"),
    field("extentTypeCode", "Extent Type Code", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:extent/gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox/gmd:extentTypeCode/gco:Boolean"),
    field("westBoundLongitude", "West Bound Longitude", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:extent/gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox/gmd:westBoundLongitude/gco:Decimal"),
    field("eastBoundLongitude", "East Bound Longitude", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:extent/gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox/gmd:eastBoundLongitude/gco:Decimal"),
    field("southBoundLatitude", "South Bound Latitude", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:extent/gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox/gmd:southBoundLatitude/gco:Decimal"),
    field("northBoundLatitude", "North Bound Latitude", ".//gmd:identificationInfo/gmd:MD_DataIdentification/gmd:extent/gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox/gmd:northBoundLatitude/gco:Decimal"),
    field("distributionFormatName", "Distribution Format Name", ".//gmd:distributionInfo/gmd:MD_Distribution/gmd:distributionFormat/gmd:MD_Format/gmd:name/gco:CharacterString"),
    field("distributionFormatVersion", "Distribution Format Version", ".//gmd:distributionInfo/gmd:MD_Distribution/gmd:distributionFormat/gmd:MD_Format/gmd:version/gco:CharacterString"),
    field("transferSize", "Transfer Size", ".//gmd:distributionInfo/gmd:MD_Distribution/gmd:transferOptions/gmd:MD_DigitalTransferOptions/gmd:transferSize/gco:Real"),
    field("lineageStatement", "Lineage Statement", ".//gmd:dataQualityInfo/gmd:DQ_DataQuality/gmd:lineage/gmd:LI_Lineage/gmd:statement/gco:CharacterString"),
];

/// Layer facts appended after the document fields
pub const LAYER_EXTRAS: &[&str] = &[
    "__license_type",
    "__license_url",
    "__num_downloads",
    "__first_published_at",
    "__is_public",
];

/// A flattened view of one layer's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSummary {
    pub layer_id: u64,
    values: BTreeMap<&'static str, String>,
}

impl MetadataSummary {
    /// Report column headers, matching [`row`](Self::row)
    pub fn headers() -> Vec<&'static str> {
        std::iter::once("__layer_id")
            .chain(SUMMARY_FIELDS.iter().map(|f| f.header))
            .chain(LAYER_EXTRAS.iter().copied())
            .collect()
    }

    /// Values in column order
    pub fn row(&self) -> Vec<String> {
        std::iter::once(self.layer_id.to_string())
            .chain(SUMMARY_FIELDS.iter().map(|f| self.value(f.key)))
            .chain(LAYER_EXTRAS.iter().map(|key| self.value(key)))
            .collect()
    }

    /// Value of a field or extra by key (`"title"`, `"__license_type"`)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}

/// Summarize a parsed document for `layer`
pub fn summarize(document: &mut MetadataDocument, layer: &Layer) -> Result<MetadataSummary> {
    let namespaces = NamespaceMap::iso19139();
    let mut values = BTreeMap::new();

    for field in SUMMARY_FIELDS {
        let path = ElementPath::parse(field.path)?;
        let text = document
            .select_with(&path, &namespaces)?
            .into_iter()
            .next()
            .and_then(|node| document.element_text(node).map(str::to_string))
            .unwrap_or_default();
        values.insert(field.key, text);
    }

    values.insert("__license_type", layer.license_type().unwrap_or_default().to_string());
    values.insert("__license_url", layer.license_url().unwrap_or_default().to_string());
    values.insert(
        "__num_downloads",
        layer.num_downloads.map(|n| n.to_string()).unwrap_or_default(),
    );
    values.insert(
        "__first_published_at",
        layer.first_published_at.clone().unwrap_or_default(),
    );
    values.insert("__is_public", bool_cell(layer.is_public()).to_string());

    Ok(MetadataSummary {
        layer_id: layer.id,
        values,
    })
}

/// Summarize the document stored at `path`
pub fn summarize_file(path: &Path, layer: &Layer) -> Result<MetadataSummary> {
    let mut document = MetadataDocument::from_file(path)?;
    summarize(&mut document, layer)
}
