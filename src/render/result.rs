//! Split result with artifacts and statistics.

use serde::{Deserialize, Serialize};

use super::StripStats;
use crate::error::Result;
use crate::model::{Figure, SvgDocument};
use crate::parser::ClassifyStats;

/// Result of splitting one figure: the cleaned tree, the companion script
/// and what happened on the way.
#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    /// Frame, natural size and placement records
    pub figure: Figure,

    /// The document with its text removed
    #[serde(skip)]
    pub document: SvgDocument,

    /// The Typst script
    pub script: String,

    /// Non-fatal problems found while classifying
    pub diagnostics: Vec<String>,

    /// Split statistics
    pub stats: SplitStats,
}

impl SplitResult {
    /// Serialize the cleaned document, gzip-compressed if the source was.
    pub fn clean_svg(&self) -> Result<Vec<u8>> {
        super::to_svg_bytes(&self.document)
    }

    /// Concatenated text that moved into the script.
    pub fn plain_text(&self) -> String {
        self.figure.plain_text()
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Statistics collected during a split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    /// Text elements found in rendered content
    pub text_nodes: usize,

    /// Text runs extracted
    pub runs: usize,

    /// Placement records emitted
    pub placements: usize,

    /// Label lines in the script
    pub lines: usize,

    /// Text elements removed from the tree
    pub text_removed: usize,

    /// Groups removed because they became empty
    pub groups_pruned: usize,

    /// Graphics elements kept
    pub graphics: usize,

    /// Elements the classifier could not categorize
    pub unsupported: usize,

    /// Hidden text elements removed without a placement
    pub hidden_text: usize,
}

impl SplitStats {
    /// Combine the counters of each pipeline stage.
    pub fn from_parts(classify: &ClassifyStats, strip: &StripStats, figure: &Figure) -> Self {
        Self {
            text_nodes: classify.text_nodes,
            runs: classify.runs,
            placements: figure.placements.len(),
            lines: figure.line_count(),
            text_removed: strip.text_removed,
            groups_pruned: strip.groups_pruned,
            graphics: classify.graphics,
            unsupported: classify.unsupported,
            hidden_text: classify.hidden_text,
        }
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &SplitStats) {
        self.text_nodes += other.text_nodes;
        self.runs += other.runs;
        self.placements += other.placements;
        self.lines += other.lines;
        self.text_removed += other.text_removed;
        self.groups_pruned += other.groups_pruned;
        self.graphics += other.graphics;
        self.unsupported += other.unsupported;
        self.hidden_text += other.hidden_text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_stats_merge() {
        let mut stats1 = SplitStats {
            text_nodes: 2,
            placements: 3,
            ..Default::default()
        };
        let stats2 = SplitStats {
            text_nodes: 1,
            placements: 1,
            groups_pruned: 4,
            ..Default::default()
        };

        stats1.merge(&stats2);

        assert_eq!(stats1.text_nodes, 3);
        assert_eq!(stats1.placements, 4);
        assert_eq!(stats1.groups_pruned, 4);
        assert_eq!(stats1.runs, 0);
    }

    #[test]
    fn test_from_parts() {
        let classify = ClassifyStats {
            text_nodes: 2,
            hidden_text: 1,
            runs: 1,
            graphics: 5,
            ..Default::default()
        };
        let strip = StripStats {
            text_removed: 2,
            groups_pruned: 1,
        };
        let figure: Figure = serde_json::from_str(
            r#"{
                "viewport": {"width": 10.0, "height": 10.0, "view_box": null,
                             "transform": {"a": 1.0, "b": 0.0, "c": 0.0, "d": 1.0, "e": 0.0, "f": 0.0}},
                "bbox": {"min_x": 0.0, "min_y": 0.0, "max_x": 10.0, "max_y": 10.0},
                "frame": {"min_x": 0.0, "min_y": 0.0, "max_x": 10.0, "max_y": 10.0},
                "size": {"width_pt": 7.5, "height_pt": 7.5},
                "placements": []
            }"#,
        )
        .unwrap();

        let stats = SplitStats::from_parts(&classify, &strip, &figure);
        assert_eq!(stats.text_nodes, 2);
        assert_eq!(stats.hidden_text, 1);
        assert_eq!(stats.text_removed, 2);
        assert_eq!(stats.groups_pruned, 1);
        assert_eq!(stats.graphics, 5);
        assert_eq!(stats.placements, 0);
        assert_eq!(stats.lines, 0);
    }
}
