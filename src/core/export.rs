use anyhow::Context;

use super::models::CandidateRecord;

pub const CSV_HEADER: [&str; 4] = ["Name", "Email", "Phone", "Skills"];

/// `Name: ...\nSkills: ...` blocks separated by a blank line.
pub fn build_summary(records: &[CandidateRecord]) -> String {
    records
        .iter()
        .map(|record| format!("Name: {}\nSkills: {}", record.name, record.skills_display()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn records_to_csv(records: &[CandidateRecord]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            record.phone.as_str(),
            record.skills_display().as_str(),
        ])?;
    }

    let bytes = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CsvRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
}

/// Reads back a CSV produced by [`records_to_csv`].
#[cfg(test)]
pub(crate) fn parse_csv(content: &str) -> anyhow::Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default().to_string();
        let skills_cell = field(3);
        let skills = if skills_cell == super::models::NO_SKILLS {
            Vec::new()
        } else {
            skills_cell
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        rows.push(CsvRow {
            name: field(0),
            email: field(1),
            phone: field(2),
            skills,
        });
    }

    Ok(rows)
}
