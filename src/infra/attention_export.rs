// ============================================================
// Layer 6 — Attention Export
// ============================================================
// Writes one block's attention weights as long-format CSV so
// they can be plotted as a heatmap in any spreadsheet or
// plotting tool:
//
//   head,query,key,query_digit,key_digit,weight
//   0,0,0,3,3,0.412345
//   0,0,1,3,1,0.087654
//   ...

use anyhow::{ensure, Context, Result};
use std::{fs, io::Write, path::Path};

use crate::domain::sequence::DigitSequence;
use crate::ml::inferencer::AttentionMap;

pub fn write_attention_csv(path: &Path, input: &DigitSequence, map: &AttentionMap) -> Result<()> {
    ensure!(
        input.len() == map.len,
        "attention map covers {} positions but the input has {}",
        map.len, input.len(),
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut f = fs::File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    writeln!(f, "head,query,key,query_digit,key_digit,weight")?;

    let digits = input.digits();
    for head in 0..map.heads {
        for query in 0..map.len {
            for key in 0..map.len {
                writeln!(
                    f,
                    "{},{},{},{},{},{:.6}",
                    head, query, key, digits[query], digits[key],
                    map.weight(head, query, key),
                )?;
            }
        }
    }
    Ok(())
}
