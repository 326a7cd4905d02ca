use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{AnalysisStatus, MedicationAnalysis, PrescriptionRecord};

const PRESCRIPTION_COLUMNS: &str = "id, user_id, raw_text, describe, medication_name, \
     medication_name_en, dosage, frequency, instructions, side_effects, \
     contraindications, medical_notes, status, created_at, updated_at";

pub fn insert_prescription(
    conn: &Connection,
    rec: &PrescriptionRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, user_id, raw_text, describe, medication_name,
         medication_name_en, dosage, frequency, instructions, side_effects,
         contraindications, medical_notes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            rec.id.to_string(),
            rec.user_id.to_string(),
            rec.raw_text,
            rec.describe,
            rec.medication_name,
            rec.medication_name_en,
            rec.dosage,
            rec.frequency,
            rec.instructions,
            rec.side_effects,
            rec.contraindications,
            rec.medical_notes,
            rec.status.as_str(),
            rec.created_at.to_rfc3339(),
            rec.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Fetch a record by id, scoped to the owning user. A record owned by a
/// different user is indistinguishable from a missing one.
pub fn get_prescription_for_user(
    conn: &Connection,
    id: &Uuid,
    user_id: &Uuid,
) -> Result<Option<PrescriptionRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
                 WHERE id = ?1 AND user_id = ?2"
            ),
            params![id.to_string(), user_id.to_string()],
            |row| Ok(raw_prescription_row(row)),
        )
        .optional()?;

    row.map(|r| prescription_from_row(r?)).transpose()
}

/// The user's records, newest first.
pub fn list_prescriptions_for_user(
    conn: &Connection,
    user_id: &Uuid,
    limit: u32,
) -> Result<Vec<PrescriptionRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
         WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![user_id.to_string(), limit], |row| {
        Ok(raw_prescription_row(row))
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(prescription_from_row(row??)?);
    }
    Ok(records)
}

/// Write the merged analysis onto the record and mark it complete.
/// This is the single post-creation update in the record's lifecycle.
pub fn update_prescription_analysis(
    conn: &Connection,
    id: &Uuid,
    analysis: &MedicationAnalysis,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE prescriptions SET raw_text = ?2, medication_name = ?3,
         medication_name_en = ?4, dosage = ?5, frequency = ?6, instructions = ?7,
         side_effects = ?8, contraindications = ?9, medical_notes = ?10,
         status = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            id.to_string(),
            analysis.raw_text,
            analysis.medication_name,
            analysis.medication_name_en,
            analysis.dosage,
            analysis.frequency,
            analysis.instructions,
            analysis.side_effects,
            analysis.contraindications,
            analysis.medical_notes,
            AnalysisStatus::Complete.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )?;

    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Mark a record failed so it is never left in the analyzing placeholder
/// state after a mid-flight error.
pub fn mark_prescription_failed(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE prescriptions SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![
            id.to_string(),
            AnalysisStatus::Failed.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

// ── Row mapping ──

type RawPrescriptionRow = (
    String,         // id
    String,         // user_id
    String,         // raw_text
    Option<String>, // describe
    String,         // medication_name
    Option<String>, // medication_name_en
    String,         // dosage
    String,         // frequency
    String,         // instructions
    String,         // side_effects
    String,         // contraindications
    String,         // medical_notes
    String,         // status
    String,         // created_at
    String,         // updated_at
);

fn raw_prescription_row(row: &Row<'_>) -> Result<RawPrescriptionRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn prescription_from_row(row: RawPrescriptionRow) -> Result<PrescriptionRecord, DatabaseError> {
    let (
        id,
        user_id,
        raw_text,
        describe,
        medication_name,
        medication_name_en,
        dosage,
        frequency,
        instructions,
        side_effects,
        contraindications,
        medical_notes,
        status,
        created_at,
        updated_at,
    ) = row;

    let status = AnalysisStatus::from_str(&status).map_err(|value| DatabaseError::InvalidEnum {
        field: "status".into(),
        value,
    })?;

    Ok(PrescriptionRecord {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        user_id: Uuid::parse_str(&user_id).unwrap_or_default(),
        raw_text,
        describe,
        medication_name,
        medication_name_en,
        dosage,
        frequency,
        instructions,
        side_effects,
        contraindications,
        medical_notes,
        status,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}
