// ============================================================
// Layer 1 — Text Heatmap
// ============================================================
// Renders an attention map in the terminal. Rows are querying
// positions, columns are attended positions, and each cell is
// shaded by weight:
//
//          3  1  2
//     3 |  @  .  :
//     1 |  .  #  .
//     2 |  :  .  %

use anyhow::{ensure, Result};

use crate::domain::sequence::DigitSequence;
use crate::ml::inferencer::AttentionMap;

const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

fn shade(weight: f32) -> char {
    let idx = (weight.clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round() as usize;
    SHADES[idx.min(SHADES.len() - 1)]
}

/// `head = None` averages over all heads.
pub fn render(input: &DigitSequence, map: &AttentionMap, head: Option<usize>) -> Result<String> {
    if let Some(h) = head {
        ensure!(h < map.heads, "head {} does not exist; block {} has {} head(s)", h, map.block, map.heads);
    }
    let cells: Vec<f32> = match head {
        Some(h) => (0..map.len).flat_map(|q| map.row(h, q).to_vec()).collect(),
        None    => map.head_mean(),
    };

    let digits = input.digits();
    let mut out = String::from("      ");
    for d in digits.iter().take(map.len) {
        out.push_str(&format!("{d:>3}"));
    }
    out.push('\n');
    for (q, row) in cells.chunks(map.len.max(1)).enumerate() {
        out.push_str(&format!("{:>4} |", digits.get(q).copied().unwrap_or_default()));
        for &w in row {
            out.push_str(&format!("  {}", shade(w)));
        }
        out.push('\n');
    }
    Ok(out)
}
