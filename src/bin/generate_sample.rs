// Writes a synthetic cutoff-rank table in the published sheet layout:
// placeholder header row, then the real labels, then data.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const PARQUET_PATH: &str = "sample_cutoffs.parquet";
const CSV_PATH: &str = "sample_cutoffs.csv";

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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const CATEGORIES: [&str; 9] = [
    "OC",
    "BC_A",
    "BC_B",
    "BC_C",
    "BC_D",
    "BC_E",
    "SC",
    "ST",
    "EWS_GEN_OU",
];

/// Relative cutoff per category: reserved categories close later.
const CATEGORY_FACTOR: [f64; 9] = [1.0, 1.9, 1.4, 2.6, 1.3, 1.5, 3.2, 3.6, 1.2];

const BRANCHES: [(&str, &str, f64); 6] = [
    ("CSE", "COMPUTER SCIENCE AND ENGINEERING", 0.6),
    ("CSM", "CSE (ARTIFICIAL INTELLIGENCE AND MACHINE LEARNING)", 0.7),
    ("ECE", "ELECTRONICS AND COMMUNICATION ENGINEERING", 1.0),
    ("EEE", "ELECTRICAL AND ELECTRONICS ENGINEERING", 1.6),
    ("MEC", "MECHANICAL ENGINEERING", 2.2),
    ("CIV", "CIVIL ENGINEERING", 2.5),
];

const DISTRICTS: [(&str, &str); 6] = [
    ("HYD", "HYDERABAD"),
    ("RR", "GANDIPET"),
    ("MDL", "MEDCHAL"),
    ("WGL", "WARANGAL"),
    ("KMM", "KHAMMAM"),
    ("NLG", "NALGONDA"),
];

fn main() {
    let mut rng = SimpleRng::new(42);

    let mut labels: Vec<String> = [
        "Inst Code",
        "Institute Name",
        "Place",
        "Dist Code",
        "Co Education",
        "College Type",
        "Year of Estab",
        "Branch Code",
        "Branch Name",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for category in CATEGORIES {
        labels.push(format!("{category}_BOYS"));
        labels.push(format!("{category}_GIRLS"));
    }
    labels.extend(["Tution Fee", "Affiliated To", "A_REG"].map(String::from));

    // Column-major, first cell of every column is its label.
    let mut columns: Vec<Vec<Option<String>>> =
        labels.iter().map(|l| vec![Some(l.clone())]).collect();

    let mut row_count = 0;
    for college in 0..60 {
        let inst = format!("C{college:03}");
        let (dist, place) = DISTRICTS[college % DISTRICTS.len()];
        let prestige = 1_500.0 + rng.next_f64() * 60_000.0;
        let kind = rng.pick(&["PVT", "PVT", "PVT", "UNIV"]);
        let coed = rng.pick(&["COED", "COED", "GIRLS"]);
        let region = rng.pick(&["OU", "OU", "AU", "SVU"]);
        let year = 1980 + (rng.next_u64() % 40);
        let fee = 35_000 + (rng.next_u64() % 12) * 10_000;

        for &(code, name, branch_factor) in &BRANCHES {
            if rng.next_f64() < 0.25 {
                continue;
            }
            let mut row: Vec<Option<String>> = vec![
                Some(inst.clone()),
                Some(format!("SAMPLE INSTITUTE OF TECHNOLOGY {college}")),
                Some(place.to_string()),
                Some(dist.to_string()),
                Some(coed.to_string()),
                Some(kind.to_string()),
                Some(year.to_string()),
                Some(code.to_string()),
                Some(name.to_string()),
            ];
            for factor in CATEGORY_FACTOR {
                for gender_factor in [1.0, 1.08] {
                    // Roughly one seat in ten is not offered / left blank.
                    let cutoff = (rng.next_f64() > 0.1).then(|| {
                        let noise = 0.85 + rng.next_f64() * 0.3;
                        let rank = prestige * branch_factor * factor * gender_factor * noise;
                        (rank.round() as u64).to_string()
                    });
                    row.push(cutoff);
                }
            }
            row.push(Some(fee.to_string()));
            row.push(Some("JNTUH".to_string()));
            row.push(Some(region.to_string()));

            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
            row_count += 1;
        }
    }

    // Placeholder header: what a spreadsheet export without a header row yields.
    let placeholder: Vec<String> = (0..labels.len()).map(|i| format!("Unnamed: {i}")).collect();

    write_parquet(PARQUET_PATH, &placeholder, &columns);
    write_csv(CSV_PATH, &placeholder, &columns);

    println!(
        "Wrote {row_count} college-branch rows ({} columns) to {PARQUET_PATH} and {CSV_PATH}",
        labels.len()
    );
}

fn write_parquet(path: &str, placeholder: &[String], columns: &[Vec<Option<String>>]) {
    let schema = Arc::new(Schema::new(
        placeholder
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|values| Arc::new(StringArray::from(values.clone())) as ArrayRef)
        .collect();

    let batch =
        RecordBatch::try_new(schema.clone(), arrays).expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn write_csv(path: &str, placeholder: &[String], columns: &[Vec<Option<String>>]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create output file");
    writer.write_record(placeholder).expect("Failed to write header");
    let rows = columns.first().map_or(0, Vec::len);
    for row in 0..rows {
        writer
            .write_record(columns.iter().map(|c| c[row].as_deref().unwrap_or("")))
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}
