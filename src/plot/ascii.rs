//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (one column per bin, fixed height), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - target mass: `#` bars
//! - approximation: `o` markers
//! - error strip (last row): `+` target above approximation, `-` below, `.` close

/// Fraction of the plot's y-range below which an error counts as "close".
const ERROR_BAND: f64 = 0.01;

/// Render target bars with the approximation overlaid.
pub fn render_fit_plot(target: &[f64], approximation: &[f64], height: usize) -> String {
    let width = target.len().min(approximation.len());
    let height = height.max(3);

    let (y_min, y_max) = y_range(target, approximation).unwrap_or((0.0, 1.0));
    let mut grid = vec![vec![' '; width]; height];
    let base = map_y(0.0, y_min, y_max, height);

    for (x, &t) in target.iter().take(width).enumerate() {
        if t <= 0.0 {
            continue;
        }
        let top = map_y(t, y_min, y_max, height);
        for row in grid.iter_mut().take(base + 1).skip(top) {
            row[x] = '#';
        }
    }

    for (x, &a) in approximation.iter().take(width).enumerate() {
        grid[map_y(a, y_min, y_max, height)][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: bins=[0, {}] | y=[{y_min:.4}, {y_max:.4}] | #=target o=approximation\n",
        width.saturating_sub(1)
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&error_strip(target, approximation, (y_max - y_min) * ERROR_BAND));
    out.push('\n');

    out
}

fn error_strip(target: &[f64], approximation: &[f64], band: f64) -> String {
    target
        .iter()
        .zip(approximation.iter())
        .map(|(&t, &a)| {
            let d = t - a;
            if d > band {
                '+'
            } else if d < -band {
                '-'
            } else {
                '.'
            }
        })
        .collect()
}

fn y_range(target: &[f64], approximation: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = 0.0_f64;
    let mut max_y = f64::NEG_INFINITY;
    for &v in target.iter().chain(approximation.iter()) {
        if v.is_finite() {
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }
    if max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let target = [0.0, 1.0, 2.0, 1.0];
        let approx = [0.0, 1.0, 1.0, 1.0];
        let txt = render_fit_plot(&target, &approx, 5);
        let expected = concat!(
            "Plot: bins=[0, 3] | y=[0.0000, 2.0000] | #=target o=approximation\n",
            "  # \n",
            "  # \n",
            " ooo\n",
            " ###\n",
            "o###\n",
            "..+.\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn flat_zero_input_does_not_panic() {
        let txt = render_fit_plot(&[0.0; 6], &[0.0; 6], 4);
        assert!(txt.ends_with("......\n"));
    }
}
