use serde::Serialize;

use super::domain::Lead;

#[derive(Serialize)]
struct LeadRow<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    occupation_code: &'a str,
    visa_subclass: &'a str,
    points: Option<u32>,
    status: &'static str,
    notes: &'a str,
    created_by: &'a str,
    created_at: String,
}

impl<'a> From<&'a Lead> for LeadRow<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            id: &lead.id.0,
            name: &lead.name,
            email: &lead.email,
            phone: lead.phone.as_deref().unwrap_or_default(),
            occupation_code: lead.occupation_code.as_deref().unwrap_or_default(),
            visa_subclass: lead.visa_subclass.as_deref().unwrap_or_default(),
            points: lead.points,
            status: lead.status.label(),
            notes: lead.notes.as_deref().unwrap_or_default(),
            created_by: &lead.created_by.0,
            created_at: lead.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("csv buffer could not be flushed: {0}")]
    Flush(String),
    #[error("csv output is not utf-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render leads as CSV with a header row, even when there are no leads.
pub fn leads_to_csv(leads: &[Lead]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "id",
        "name",
        "email",
        "phone",
        "occupation_code",
        "visa_subclass",
        "points",
        "status",
        "notes",
        "created_by",
        "created_at",
    ])?;
    for lead in leads {
        writer.serialize(LeadRow::from(lead))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
