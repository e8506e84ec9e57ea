//! Core data types exchanged with the studio service and returned to callers.
//!
//! Remote records are deserialized from the service's camelCase JSON and keep
//! only the fields the transfer pipeline reads.

use serde::{Deserialize, Deserializer, Serialize};

/// A photo record as returned by `photos/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    /// Location of the processed asset, absent until the job completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retouched_url: Option<String>,

    /// Location of the uploaded original
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,

    /// Owning job, if any (profile photos have none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,

    /// Embedded job summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSummary>,
}

impl PhotoRecord {
    /// Profile id reachable through the embedded job summary.
    pub fn profile_id(&self) -> Option<u64> {
        self.job.as_ref().and_then(|job| job.profile_id)
    }
}

/// The slice of a job embedded in a photo record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub profile_id: Option<u64>,
}

/// A job record as returned by `jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    /// Job type; "regular" jobs tag their uploads
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,

    #[serde(default)]
    pub profile_id: Option<u64>,
}

impl JobRecord {
    /// Whether uploads into this job carry the bucket tagging header.
    pub fn is_regular(&self) -> bool {
        self.job_type.as_deref() == Some("regular")
    }
}

/// Profile output policy as returned by `profiles/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    pub id: u64,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_extract: bool,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub replace_background: bool,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub dual_file_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file_type: Option<String>,

    /// Photos attached to the profile, in the service's order
    #[serde(default)]
    pub photos: Vec<ProfilePhoto>,
}

impl ProfileSettings {
    /// Output extension for composited images, `png` when unset.
    pub fn output_file_type(&self) -> &str {
        match self.output_file_type.as_deref() {
            Some(ext) if !ext.trim().is_empty() => ext.trim(),
            _ => "png",
        }
    }

    /// Standalone background photos (no owning job), in profile order.
    pub fn background_photos(&self) -> impl Iterator<Item = &ProfilePhoto> {
        self.photos.iter().filter(|photo| photo.job_id.is_none())
    }

    /// Whether the profile declares any standalone background.
    pub fn has_backgrounds(&self) -> bool {
        self.background_photos().next().is_some()
    }
}

/// A photo attached to a profile; backgrounds have no `job_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePhoto {
    pub id: u64,

    #[serde(default)]
    pub job_id: Option<u64>,

    #[serde(default)]
    pub original_url: Option<String>,
}

/// The owner a new photo record is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRef {
    Job(u64),
    Profile(u64),
}

impl OwnerRef {
    /// The create-photo payload key for this owner.
    pub fn id_field(&self) -> &'static str {
        match self {
            OwnerRef::Job(_) => "job_id",
            OwnerRef::Profile(_) => "profile_id",
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            OwnerRef::Job(id) | OwnerRef::Profile(id) => *id,
        }
    }
}

/// A photo to include in a batch download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<u64> for PhotoRef {
    fn from(id: u64) -> Self {
        Self { id, name: None }
    }
}

impl From<&PhotoRecord> for PhotoRef {
    fn from(record: &PhotoRecord) -> Self {
        Self {
            id: record.id,
            name: Some(record.name.clone()),
        }
    }
}

/// Outcome of downloading a single photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub file_name: String,
    pub succeeded: bool,
}

impl TransferOutcome {
    pub fn success(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            succeeded: true,
        }
    }

    pub fn failure(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            succeeded: false,
        }
    }
}

/// Partition of a batch download into succeeded and errored file names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success_photos: Vec<String>,
    pub errored_photos: Vec<String>,
}

impl BatchResult {
    /// Record one outcome in the matching list.
    pub fn push(&mut self, outcome: TransferOutcome) {
        if outcome.succeeded {
            self.success_photos.push(outcome.file_name);
        } else {
            self.errored_photos.push(outcome.file_name);
        }
    }

    /// Total number of photos accounted for.
    pub fn len(&self) -> usize {
        self.success_photos.len() + self.errored_photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<TransferOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = TransferOutcome>>(iter: I) -> Self {
        let mut result = BatchResult::default();
        for outcome in iter {
            result.push(outcome);
        }
        result
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub photo: PhotoRecord,

    /// Status of the presigned PUT
    pub upload_status_code: Option<u16>,
}

/// Accept `true`/`false`, `"true"`/`"false"`, or null for profile flags.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(flag)) => flag,
        Some(serde_json::Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
