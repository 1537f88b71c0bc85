// tabular.rs - Coordinate and morphometric table loaders

use crate::data::spart::LatLon;
use crate::error::{ConcordanceError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Values of one measured trait, keyed by individual id
#[derive(Debug, Clone, PartialEq)]
pub struct TraitMeasurements {
    pub name: String,
    pub values: HashMap<String, f64>,
}

/// All traits of a morphometric table, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphometricTable {
    pub traits: Vec<TraitMeasurements>,
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell == "?"
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => b',',
        _ => b'\t',
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path).map_err(|e| ConcordanceError::io(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(file))
}

/// Finite numbers only; `inf` and `NaN` are rejected like any other garbage
fn parse_number(cell: &str, line: u64, column: &str) -> Result<f64> {
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ConcordanceError::InvalidInput(format!(
            "line {}: '{}' in column '{}' is not a finite number",
            line, cell, column
        ))),
    }
}

/// Read `id, latitude, longitude` rows; rows with a blank coordinate are skipped
pub fn read_coordinates(path: &Path) -> Result<HashMap<String, LatLon>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.len() < 3 {
        return Err(ConcordanceError::InvalidInput(format!(
            "{}: coordinate table needs id, latitude and longitude columns",
            path.display()
        )));
    }

    let mut coordinates = HashMap::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let id = record.get(0).unwrap_or("");
        let lat = record.get(1).unwrap_or("");
        let lon = record.get(2).unwrap_or("");
        if id.is_empty() {
            continue;
        }
        if is_missing(lat) || is_missing(lon) {
            skipped += 1;
            continue;
        }

        let latitude = parse_number(lat, line, &headers[1])?;
        let longitude = parse_number(lon, line, &headers[2])?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ConcordanceError::InvalidInput(format!(
                "line {}: coordinates ({}, {}) of '{}' are out of range",
                line, latitude, longitude, id
            )));
        }
        if coordinates
            .insert(id.to_string(), LatLon::new(latitude, longitude))
            .is_some()
        {
            return Err(ConcordanceError::InvalidInput(format!(
                "line {}: individual '{}' appears twice in coordinate table",
                line, id
            )));
        }
    }

    log::info!(
        "Loaded coordinates for {} individuals from {} ({} rows without coordinates)",
        coordinates.len(),
        path.display(),
        skipped
    );
    Ok(coordinates)
}

/// Read `id, trait1, trait2, ...` rows; blank cells are missing measurements
pub fn read_morphometrics(path: &Path) -> Result<MorphometricTable> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(ConcordanceError::InvalidInput(format!(
            "{}: morphometric table needs an id column and at least one trait",
            path.display()
        )));
    }

    let mut traits: Vec<TraitMeasurements> = headers
        .iter()
        .skip(1)
        .map(|name| TraitMeasurements {
            name: name.to_string(),
            values: HashMap::new(),
        })
        .collect();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let id = record.get(0).unwrap_or("");
        if id.is_empty() {
            continue;
        }
        for (measurement, cell) in traits.iter_mut().zip(record.iter().skip(1)) {
            if is_missing(cell) {
                continue;
            }
            let value = parse_number(cell, line, &measurement.name)?;
            if measurement.values.insert(id.to_string(), value).is_some() {
                return Err(ConcordanceError::InvalidInput(format!(
                    "line {}: individual '{}' appears twice in morphometric table",
                    line, id
                )));
            }
        }
    }

    log::info!(
        "Loaded {} morphometric traits from {}",
        traits.len(),
        path.display()
    );
    Ok(MorphometricTable { traits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_coordinates_tsv() {
        let file = temp_file(
            ".tsv",
            "id\tlat\tlon\na\t45.5\t10.25\nb\tNA\t11.0\nc\t-12\t-70.5\n",
        );
        let coordinates = read_coordinates(file.path()).unwrap();
        assert_eq!(coordinates.len(), 2);
        assert_eq!(coordinates["a"], LatLon::new(45.5, 10.25));
        assert_eq!(coordinates["c"], LatLon::new(-12.0, -70.5));
        assert!(!coordinates.contains_key("b"));
    }

    #[test]
    fn test_read_coordinates_rejects_garbage() {
        let file = temp_file(".csv", "id,lat,lon\na,north,10\n");
        assert!(matches!(
            read_coordinates(file.path()),
            Err(ConcordanceError::InvalidInput(_))
        ));

        let file = temp_file(".csv", "id,lat,lon\na,95,10\n");
        assert!(read_coordinates(file.path()).is_err());
    }

    #[test]
    fn test_read_morphometrics_csv() {
        let file = temp_file(
            ".csv",
            "id,length,width\na,1.5,0.3\nb,,0.4\nc,2.5,NA\n",
        );
        let table = read_morphometrics(file.path()).unwrap();
        assert_eq!(table.traits.len(), 2);
        assert_eq!(table.traits[0].name, "length");
        assert_eq!(table.traits[0].values.len(), 2);
        assert_eq!(table.traits[0].values["c"], 2.5);
        assert_eq!(table.traits[1].values.len(), 2);
        assert_eq!(table.traits[1].values["b"], 0.4);
    }

    #[test]
    fn test_non_finite_cells_are_rejected() {
        for cell in ["inf", "-inf", "NaN"] {
            let file = temp_file(".csv", &format!("id,length\na,1.0\nb,{}\n", cell));
            assert!(matches!(
                read_morphometrics(file.path()),
                Err(ConcordanceError::InvalidInput(_))
            ));
        }

        let file = temp_file(".tsv", "id\tlat\tlon\na\tinf\t10\n");
        assert!(read_coordinates(file.path()).is_err());
    }
}
