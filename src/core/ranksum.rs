// ranksum.rs - Two-sided Mann-Whitney U test

/// Largest sample size for which the exact null distribution is used
pub const EXACT_MAX_SAMPLE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSumMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSumResult {
    /// U statistic of the first sample
    pub u: f64,
    pub p_value: f64,
    pub method: RankSumMethod,
}

/// Complementary error function (Chebyshev fit, fractional error below 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Midranks of the pooled samples, with the size of every tie group
fn pooled_ranks(a: &[f64], b: &[f64]) -> (f64, Vec<usize>) {
    let mut pooled: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut rank_sum_a = 0.0;
    let mut ties = Vec::new();
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // Ranks start + 1 ..= end share their mean
        let midrank = (start + 1 + end) as f64 / 2.0;
        let in_a = pooled[start..end].iter().filter(|(_, first)| *first).count();
        rank_sum_a += midrank * in_a as f64;
        if end - start > 1 {
            ties.push(end - start);
        }
        start = end;
    }
    (rank_sum_a, ties)
}

/// P(U >= u) under the null hypothesis, by counting rank arrangements
fn exact_upper_tail(n1: usize, n2: usize, u: f64) -> f64 {
    // counts[i][j][k]: arrangements of i and j values giving U = k
    let mut counts: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n2 + 1]; n1 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            let mut current = vec![0.0; i * j + 1];
            if i == 0 || j == 0 {
                current[0] = 1.0;
            } else {
                // Largest value from the first sample beats all j values of the second
                for (k, c) in counts[i - 1][j].iter().enumerate() {
                    current[k + j] += c;
                }
                for (k, c) in counts[i][j - 1].iter().enumerate() {
                    current[k] += c;
                }
            }
            counts[i][j] = current;
        }
    }

    let distribution = &counts[n1][n2];
    let total: f64 = distribution.iter().sum();
    let from = (u.ceil().max(0.0) as usize).min(distribution.len());
    distribution[from..].iter().sum::<f64>() / total
}

fn asymptotic_p_value(n1: usize, n2: usize, u_max: f64, ties: &[usize]) -> f64 {
    let n = (n1 + n2) as f64;
    let product = (n1 * n2) as f64;
    let mean = product / 2.0;
    let tie_term: f64 = ties.iter().map(|&t| (t * t * t - t) as f64).sum::<f64>() / (n * (n - 1.0));
    let variance = product / 12.0 * ((n + 1.0) - tie_term);
    if variance <= 0.0 {
        return 1.0;
    }
    let z = (u_max - mean - 0.5) / variance.sqrt();
    erfc(z / std::f64::consts::SQRT_2)
}

/// Two-sided Mann-Whitney U test; `None` when either sample is empty
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<RankSumResult> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (n1, n2) = (a.len(), b.len());
    let (rank_sum_a, ties) = pooled_ranks(a, b);
    let u1 = rank_sum_a - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u_max = u1.max(u2);

    let (p_value, method) = if n1 <= EXACT_MAX_SAMPLE && n2 <= EXACT_MAX_SAMPLE && ties.is_empty() {
        (2.0 * exact_upper_tail(n1, n2, u_max), RankSumMethod::Exact)
    } else {
        (asymptotic_p_value(n1, n2, u_max, &ties), RankSumMethod::Asymptotic)
    };

    Some(RankSumResult {
        u: u1,
        p_value: p_value.clamp(0.0, 1.0),
        method,
    })
}
