//! Partition extraction: archive struct → normalized records
//!
//! A partition archive holds one 1x1 struct whose fields are per-record arrays
//! of equal length. Fields are located by name, falling back to their usual
//! position. A missing field is logged once and every record gets the field's
//! sentinel.

use crate::decode::{
    decode_age, decode_celeb_id, decode_dob, decode_face_location, decode_float, decode_gender,
    decode_path, decode_text, format_dob, format_face_location,
};
use crate::matfile::{Element, MatArray, MatFile, StructArray};
use crate::NormalizeError;
use facemeta_common::config::{PartitionConfig, PlausibilityLimits};
use facemeta_common::record::{
    NormalizedRecord, EMPTY_FACE_LOCATION, UNKNOWN, UNKNOWN_CELEB_ID,
};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Which of the two source collections a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Primary,
    Secondary,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Primary => f.write_str("primary"),
            Partition::Secondary => f.write_str("secondary"),
        }
    }
}

/// Source fields, in their usual struct order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceField {
    Dob,
    PhotoTaken,
    FullPath,
    Gender,
    Name,
    FaceLocation,
    FaceScore,
    SecondFaceScore,
    CelebNames,
    CelebId,
}

impl SourceField {
    pub const ALL: [SourceField; 10] = [
        SourceField::Dob,
        SourceField::PhotoTaken,
        SourceField::FullPath,
        SourceField::Gender,
        SourceField::Name,
        SourceField::FaceLocation,
        SourceField::FaceScore,
        SourceField::SecondFaceScore,
        SourceField::CelebNames,
        SourceField::CelebId,
    ];

    /// Field name inside the archive struct
    pub fn name(&self) -> &'static str {
        match self {
            SourceField::Dob => "dob",
            SourceField::PhotoTaken => "photo_taken",
            SourceField::FullPath => "full_path",
            SourceField::Gender => "gender",
            SourceField::Name => "name",
            SourceField::FaceLocation => "face_location",
            SourceField::FaceScore => "face_score",
            SourceField::SecondFaceScore => "second_face_score",
            SourceField::CelebNames => "celeb_names",
            SourceField::CelebId => "celeb_id",
        }
    }

    /// Usual position inside the archive struct
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

/// Per-field fallback counters for one decoded partition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub records: usize,
    pub unknown_dob: usize,
    pub unknown_age: usize,
    pub unknown_name: usize,
    pub unknown_path: usize,
    pub empty_face_location: usize,
    pub unknown_celeb_id: usize,
}

impl fmt::Display for DecodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records ({} unknown dob, {} unknown age, {} unknown name, {} unknown path, {} empty face box, {} unknown id)",
            self.records,
            self.unknown_dob,
            self.unknown_age,
            self.unknown_name,
            self.unknown_path,
            self.empty_face_location,
            self.unknown_celeb_id
        )
    }
}

/// Decoded partition
#[derive(Debug, Clone, Default)]
pub struct PartitionData {
    pub records: Vec<NormalizedRecord>,
    pub stats: DecodeStats,
    /// Length of the identity-name list, when present
    pub identity_names: usize,
}

/// Per-field arrays of one partition struct
pub struct SourceColumns<'a> {
    fields: [Option<&'a MatArray>; 10],
}

impl<'a> SourceColumns<'a> {
    /// Locate every source field in a 1x1 struct
    pub fn from_struct(source: &'a StructArray, partition: Partition) -> Self {
        let mut fields = [None; 10];
        for field in SourceField::ALL {
            let found = source.field(0, field.name()).or_else(|| {
                // Positional fallback only when the struct uses other names
                if source.field_index(field.name()).is_none()
                    && source.field_names.len() > field.ordinal()
                    && !SourceField::ALL
                        .iter()
                        .any(|f| source.field_names[field.ordinal()] == f.name())
                {
                    source.field_at(0, field.ordinal())
                } else {
                    None
                }
            });
            if found.is_none() {
                warn!(
                    "{} partition has no '{}' field; using sentinel values",
                    partition,
                    field.name()
                );
            }
            fields[field.ordinal()] = found;
        }
        Self { fields }
    }

    pub fn field(&self, field: SourceField) -> Option<&'a MatArray> {
        self.fields[field.ordinal()]
    }

    /// Element `index` of a per-record field
    pub fn get(&self, field: SourceField, index: usize) -> Option<Element<'a>> {
        self.field(field)?.element(index)
    }

    /// Record count: length of `dob`, or the longest per-record field
    ///
    /// Only arrays with an element view count; struct and undecoded arrays
    /// hold no per-record values.
    pub fn record_count(&self) -> usize {
        let indexable =
            |a: &&MatArray| !matches!(a, MatArray::Struct(_) | MatArray::Unsupported { .. });
        if let Some(dob) = self.field(SourceField::Dob).filter(indexable) {
            return dob.len();
        }
        SourceField::ALL
            .iter()
            .filter(|f| **f != SourceField::CelebNames)
            .filter_map(|f| self.field(*f))
            .filter(indexable)
            .map(|a| a.len())
            .max()
            .unwrap_or(0)
    }
}

/// Decode one record; never fails, undecodable fields become sentinels
pub fn decode_record(
    columns: &SourceColumns<'_>,
    index: usize,
    prefix: &str,
    limits: &PlausibilityLimits,
    stats: &mut DecodeStats,
) -> NormalizedRecord {
    let dob = decode_dob(columns.get(SourceField::Dob, index), limits);
    let photo_taken = decode_float(columns.get(SourceField::PhotoTaken, index));
    let age = decode_age(dob, photo_taken, limits);

    let name = decode_text(columns.get(SourceField::Name, index)).unwrap_or_else(|| {
        stats.unknown_name += 1;
        UNKNOWN.to_string()
    });
    let path = decode_path(prefix, columns.get(SourceField::FullPath, index)).unwrap_or_else(|| {
        debug!("Record {} has no decodable path fragment", index);
        stats.unknown_path += 1;
        format!("{}{}", prefix, UNKNOWN)
    });
    let face_location = decode_face_location(columns.get(SourceField::FaceLocation, index))
        .map(format_face_location)
        .unwrap_or_else(|| {
            stats.empty_face_location += 1;
            EMPTY_FACE_LOCATION.to_string()
        });
    let celeb_id = decode_celeb_id(columns.get(SourceField::CelebId, index)).unwrap_or_else(|| {
        stats.unknown_celeb_id += 1;
        UNKNOWN_CELEB_ID
    });

    if dob.is_none() {
        stats.unknown_dob += 1;
    }
    if age < 0 {
        stats.unknown_age += 1;
    }
    stats.records += 1;

    NormalizedRecord {
        age,
        gender: decode_gender(columns.get(SourceField::Gender, index)),
        path,
        name,
        dob: format_dob(dob),
        photo_taken,
        face_location,
        face_score1: decode_float(columns.get(SourceField::FaceScore, index)),
        face_score2: decode_float(columns.get(SourceField::SecondFaceScore, index)),
        celeb_id,
    }
}

/// Decode every record of a partition struct
pub fn decode_partition(
    source: &StructArray,
    partition: Partition,
    prefix: &str,
    limits: &PlausibilityLimits,
) -> PartitionData {
    let columns = SourceColumns::from_struct(source, partition);
    let count = columns.record_count();
    let identity_names = columns.field(SourceField::CelebNames).map_or(0, |a| a.len());

    let mut stats = DecodeStats::default();
    let records = (0..count)
        .map(|i| decode_record(&columns, i, prefix, limits, &mut stats))
        .collect();

    info!("Decoded {} partition: {}", partition, stats);
    PartitionData {
        records,
        stats,
        identity_names,
    }
}

/// Locate the partition struct inside a parsed archive
///
/// The configured variable name is preferred; otherwise the first struct
/// variable in the file is used.
pub fn partition_struct<'a>(
    file: &'a MatFile,
    variable: &str,
) -> Result<&'a StructArray, NormalizeError> {
    if let Some(s) = file.variable(variable).and_then(MatArray::as_struct) {
        return Ok(s);
    }
    match file.first_struct() {
        Some((name, array)) => {
            warn!("Variable '{}' not found, using struct '{}'", variable, name);
            array
                .as_struct()
                .ok_or_else(|| NormalizeError::MissingVariable(variable.to_string()))
        }
        None => Err(NormalizeError::MissingVariable(variable.to_string())),
    }
}

/// Read and decode a partition archive from disk
pub fn load_partition(
    archive: &Path,
    partition: Partition,
    config: &PartitionConfig,
    limits: &PlausibilityLimits,
) -> Result<PartitionData, NormalizeError> {
    info!("Loading {} archive {}", partition, archive.display());
    let file = MatFile::open(archive)?;
    let source = partition_struct(&file, &config.variable)?;
    let data = decode_partition(source, partition, &config.path_prefix, limits);
    if data.identity_names > 0 {
        info!("{} partition lists {} identities", partition, data.identity_names);
    }
    Ok(data)
}
