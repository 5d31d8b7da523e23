use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const FIRST_NAMES: [&str; 10] = [
    "Amani", "Liam", "Wanjiru", "Sofia", "Kenji", "Awa", "Mateo", "Priya", "Noah", "Chiara",
];
const LAST_NAMES: [&str; 10] = [
    "Otieno", "O'Brien", "Kamau", "García", "Tanaka", "Koné", "Silva", "Sharma", "Müller", "Rossi",
];
const MAJORS: [(&str, u32); 6] = [
    ("Computer Science", 30),
    ("Business", 22),
    ("Biology", 16),
    ("Mathematics", 12),
    ("Economics", 12),
    ("History", 8),
];
const COUNTRIES: [(&str, u32); 8] = [
    ("United States", 35),
    ("India", 18),
    ("Kenya", 12),
    ("China", 10),
    ("Ireland", 8),
    ("Brazil", 7),
    ("Côte d'Ivoire", 5),
    ("Germany", 5),
];
const STATUSES: [(&str, u32); 4] = [
    ("Graduated", 55),
    ("Enrolled", 30),
    ("On Leave", 8),
    ("Withdrawn", 7),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }

    /// Pick from `(item, weight)` pairs.
    fn weighted<'a>(&mut self, items: &[(&'a str, u32)]) -> &'a str {
        let total: u64 = items.iter().map(|(_, w)| u64::from(*w)).sum();
        let mut roll = self.below(total);
        for (item, w) in items {
            let w = u64::from(*w);
            if roll < w {
                return *item;
            }
            roll -= w;
        }
        items[items.len() - 1].0
    }
}

struct Student {
    fanid: i64,
    first: &'static str,
    last: &'static str,
    major: &'static str,
    country: &'static str,
    status: &'static str,
    year: Option<i64>,
    email: String,
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let students: Vec<Student> = (0..400)
        .map(|i| {
            let first = rng.pick(&FIRST_NAMES);
            let last = rng.pick(&LAST_NAMES);
            let status = rng.weighted(&STATUSES);
            // only graduates have a graduation year
            let year = (status == "Graduated").then(|| 2015 + rng.below(10) as i64);
            Student {
                fanid: 100_000 + i,
                first,
                last,
                major: rng.weighted(&MAJORS),
                country: rng.weighted(&COUNTRIES),
                status,
                year,
                email: format!("{}.{}{i}@example.edu", first.to_lowercase(), i % 97),
            }
        })
        .collect();

    write_parquet("sample_students.parquet", &students)?;
    write_csv("sample_students.csv", &students)?;

    println!(
        "Wrote {} students to sample_students.parquet and sample_students.csv",
        students.len()
    );
    Ok(())
}

fn write_parquet(path: &str, students: &[Student]) -> Result<()> {
    let text = |f: fn(&Student) -> &str| -> StringArray {
        StringArray::from(students.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("FANID", DataType::Int64, false),
        Field::new("FIRST_NAME", DataType::Utf8, false),
        Field::new("LAST_NAME", DataType::Utf8, false),
        Field::new("MAJOR", DataType::Utf8, false),
        Field::new("COUNTRY", DataType::Utf8, false),
        Field::new("ENROLLMENT_STATUS", DataType::Utf8, false),
        Field::new("GRADUATED_YEAR", DataType::Int64, true),
        Field::new("EMAIL", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(
                students.iter().map(|s| s.fanid).collect::<Vec<_>>(),
            )),
            Arc::new(text(|s| s.first)),
            Arc::new(text(|s| s.last)),
            Arc::new(text(|s| s.major)),
            Arc::new(text(|s| s.country)),
            Arc::new(text(|s| s.status)),
            Arc::new(Int64Array::from(
                students.iter().map(|s| s.year).collect::<Vec<_>>(),
            )),
            Arc::new(text(|s| s.email.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(path: &str, students: &[Student]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "FANID",
        "FIRST_NAME",
        "LAST_NAME",
        "MAJOR",
        "COUNTRY",
        "ENROLLMENT_STATUS",
        "GRADUATED_YEAR",
        "EMAIL",
    ])?;
    for s in students {
        writer.write_record([
            s.fanid.to_string(),
            s.first.to_string(),
            s.last.to_string(),
            s.major.to_string(),
            s.country.to_string(),
            s.status.to_string(),
            s.year.map(|y| y.to_string()).unwrap_or_default(),
            s.email.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
