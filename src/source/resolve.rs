use crate::model::Annotation;

/// Flattens overlapping intervals so every depth index belongs to one record.
///
/// Each elementary segment goes to the covering record with the highest
/// `(confidence, updated_at)`; on a full tie the earlier record in the list
/// keeps it. Adjacent segments won by the same id are merged again. A record
/// split by a stronger one yields several fragments that share its id.
pub fn resolve_overlaps(annotations: &[Annotation]) -> Vec<Annotation> {
    if annotations.len() <= 1 {
        return annotations.to_vec();
    }

    let mut boundaries = annotations
        .iter()
        .flat_map(|annotation| [annotation.z_start, annotation.z_end + 1])
        .collect::<Vec<_>>();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut resolved: Vec<Annotation> = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1] - 1);
        let winner = annotations
            .iter()
            .filter(|annotation| annotation.z_start <= start && end <= annotation.z_end)
            .fold(None::<&Annotation>, |best, candidate| match best {
                Some(best) if !candidate.outranks(best) => Some(best),
                _ => Some(candidate),
            });
        let Some(winner) = winner else {
            continue;
        };

        match resolved.last_mut() {
            Some(last) if last.annotation_id == winner.annotation_id && last.z_end + 1 == start => {
                last.z_end = end;
            }
            _ => {
                let mut piece = winner.clone();
                piece.z_start = start;
                piece.z_end = end;
                resolved.push(piece);
            }
        }
    }
    resolved
}
