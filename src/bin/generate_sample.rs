//! Writes a deterministic sample collisions CSV for demos and manual
//! testing: `cargo run --bin generate_sample`.

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

    /// Uniform integer in `0..bound`.
    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

const BOROUGHS: [&str; 5] = ["BRONX", "BROOKLYN", "MANHATTAN", "QUEENS", "STATEN ISLAND"];

const VEHICLE_TYPES: [&str; 6] = ["SEDAN", "SUV", "TAXI", "BICYCLE", "BUS", "PICK-UP TRUCK"];

const FACTORS: [&str; 6] = [
    "Driver Inattention/Distraction",
    "Failure to Yield Right-of-Way",
    "Following Too Closely",
    "Backing Unsafely",
    "Turning Improperly",
    "Unsafe Speed",
];

const DAYS_IN_MONTH: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_rows = 2000;

    let output_path = "collisions_sample.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");

    // Trailing spaces mimic the padding seen in public data exports; the
    // loader is expected to trim them.
    writer
        .write_record([
            "DATE",
            "TIME",
            "BOROUGH ",
            "LATITUDE",
            "LONGITUDE",
            "VEHICLE 1 TYPE",
            "VEHICLE 1 FACTOR ",
            "PERSONS INJURED",
            "PERSONS KILLED",
            "PEDESTRIANS INJURED",
            "PEDESTRIANS KILLED",
            "CYCLISTS INJURED",
            "CYCLISTS KILLED",
            "MOTORISTS INJURED",
            "MOTORISTS KILLED",
        ])
        .expect("Failed to write header");

    for _ in 0..n_rows {
        let month = rng.below(12) as usize;
        let day = rng.below(DAYS_IN_MONTH[month]) + 1;
        let date = if rng.chance(0.01) {
            // A handful of rows carry junk dates, as real exports do.
            "N/A".to_string()
        } else {
            format!("{:02}/{:02}/2021", month + 1, day)
        };
        let time = format!("{:02}:{:02}", rng.below(24), rng.below(60));

        let borough = if rng.chance(0.08) {
            ""
        } else {
            BOROUGHS[rng.below(BOROUGHS.len() as u64) as usize]
        };
        let vehicle = VEHICLE_TYPES[rng.below(VEHICLE_TYPES.len() as u64) as usize];
        let factor = if rng.chance(0.15) {
            ""
        } else {
            FACTORS[rng.below(FACTORS.len() as u64) as usize]
        };

        let (latitude, longitude) = if rng.chance(0.1) {
            (String::new(), String::new())
        } else {
            (
                format!("{:.6}", 40.5 + rng.next_f64() * 0.4),
                format!("{:.6}", -74.25 + rng.next_f64() * 0.55),
            )
        };

        let pedestrians_injured = rng.below(10).saturating_sub(7);
        let cyclists_injured = rng.below(10).saturating_sub(8);
        let motorists_injured = rng.below(6).saturating_sub(3);
        let persons_injured = pedestrians_injured + cyclists_injured + motorists_injured;
        let killed = u64::from(rng.chance(0.004));

        let counts = [
            persons_injured.to_string(),
            killed.to_string(),
            pedestrians_injured.to_string(),
            "0".to_string(),
            cyclists_injured.to_string(),
            "0".to_string(),
            motorists_injured.to_string(),
            killed.to_string(),
        ];
        let mut row: Vec<&str> = vec![
            date.as_str(),
            time.as_str(),
            borough,
            latitude.as_str(),
            longitude.as_str(),
            vehicle,
            factor,
        ];
        row.extend(counts.iter().map(String::as_str));
        writer.write_record(&row).expect("Failed to write row");
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {n_rows} collision rows to {output_path}");
}
