// Compact binary-suffix sizes: "512B", "1.5K", "932M", "1.0G".

const SUFFIXES: [&str; 6] = ["B", "K", "M", "G", "T", "P"];

pub fn fmt_size(n: u64) -> String {
    let last = SUFFIXES.len() - 1;
    let i = (0..last)
        .find(|&i| u128::from(n) < 1u128 << (10 * (i + 1)))
        .unwrap_or(last);
    let value = n as f64 / (1u64 << (10 * i)) as f64;
    if value >= 1000.0 && i < last {
        format!("1.0{}", SUFFIXES[i + 1])
    } else if value > 0.0 && value < 10.0 && i > 0 {
        format!("{value:.1}{}", SUFFIXES[i])
    } else {
        format!("{}{}", value as u64, SUFFIXES[i])
    }
}
