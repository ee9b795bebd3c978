//! Generates a test file with random data in 7 columns, one per inferable
//! type plus a string column, with occasional empty fields.
//! Can be run with `cargo run --bin generate`

extern crate rand;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use std::fs::File;
use std::io::prelude::*;

fn main() {
    let mut f = File::create("generated.csv").unwrap();
    let mut rng = thread_rng();
    f.write_all(b"col_str,col_int,col_date,col_time,col_time_stamp,col_decimal,col_bool\n")
        .unwrap();
    for _ in 0..1000000 {
        let s: String = rng.sample_iter(&Alphanumeric).take(12).collect();
        let date = format!(
            "{:04}-{:02}-{:02}",
            rng.gen_range(1970, 2038),
            rng.gen_range(1, 13),
            rng.gen_range(1, 29)
        );
        let time = format!(
            "{:02}:{:02}:{:02}",
            rng.gen_range(0, 24),
            rng.gen_range(0, 60),
            rng.gen_range(0, 60)
        );
        let decimal = if rng.gen_range::<i32, i32, i32>(0, 20) == 0 {
            String::new()
        } else {
            format!("{:.4}", rng.gen_range(-10000.0, 10000.0))
        };
        let to_insert = format!(
            "{},{},{},{},{} {},{},{}\n",
            s,
            rng.gen::<i32>(),
            date,
            time,
            date,
            time,
            decimal,
            rng.gen_range::<i32, i32, i32>(0, 2) == 1
        );
        f.write_all(to_insert.as_bytes()).unwrap();
    }
}
