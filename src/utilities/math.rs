pub fn round_to(num: f64, num_dp: usize) -> f64 {
    let ten: f64 = 10.0;
    let mult = ten.powf(num_dp as f64);
    (num * mult).round() / mult
}

pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
