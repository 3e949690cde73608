//! Pending-batch accumulation.

use crate::model::{Contribution, PendingBatch};

/// Appends a contribution's sequences to the batch, preserving arrival
/// order within each sequence and across repeated calls. Never replaces
/// prior entries.
pub fn merge(batch: &PendingBatch, contribution: Contribution) -> PendingBatch {
    let mut merged = batch.clone();
    merged.files.extend(contribution.files);
    merged.links.extend(contribution.links);
    merged.texts.extend(contribution.texts);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::FileInput;

    fn contribution(links: &[&str], texts: &[&str]) -> Contribution {
        Contribution {
            files: Vec::new(),
            links: links.iter().map(|s| s.to_string()).collect(),
            texts: texts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn merge_is_additive_across_calls() {
        let first = merge(&PendingBatch::default(), contribution(&["a"], &["t1"]));
        let second = merge(&first, contribution(&["b", "c"], &[]));

        assert_eq!(second.links, vec!["a", "b", "c"]);
        assert_eq!(second.texts, vec!["t1"]);
        // the input batch is untouched
        assert_eq!(first.links, vec!["a"]);
    }

    #[test]
    fn merge_preserves_file_arrival_order() {
        let mut c = Contribution::default();
        c.files.push(FileInput {
            filename: "stops.csv".to_string(),
            content: "aGVsbG8=".to_string(),
        });
        c.files.push(FileInput {
            filename: "more.kml".to_string(),
            content: "d29ybGQ=".to_string(),
        });

        let batch = merge(&PendingBatch::default(), c);
        let names: Vec<_> = batch.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["stops.csv", "more.kml"]);
    }
}
