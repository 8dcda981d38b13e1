use crate::grammar::MatchedRecord;
use crate::model::{BookingRecord, ImageRegion};

/// How the images of a page are assigned to its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMode {
    /// Every image has a midpoint: nearest unused image by vertical distance.
    Positional,
    /// Some image lacks a midpoint, or there are none: pair by index.
    Sequential,
}

impl CorrelationMode {
    pub fn select(images: &[ImageRegion]) -> CorrelationMode {
        if !images.is_empty() && images.iter().all(|img| img.midpoint.is_some()) {
            CorrelationMode::Positional
        } else {
            CorrelationMode::Sequential
        }
    }
}

/// Assign at most one image to each record of a page.
///
/// Returns one entry per record. In positional mode the entries are in
/// top-to-bottom order; in sequential mode they keep the order of `records`.
/// No image is handed out twice. Surplus images are dropped and surplus
/// records get `None`.
pub fn correlate(
    records: Vec<MatchedRecord>,
    images: Vec<ImageRegion>,
) -> Vec<(BookingRecord, Option<Vec<u8>>)> {
    match CorrelationMode::select(&images) {
        CorrelationMode::Positional => correlate_positional(records, images),
        CorrelationMode::Sequential => correlate_sequential(records, images),
    }
}

/// Greedy nearest-midpoint assignment.
///
/// Records are visited from the top of the page down; each takes the closest
/// image nobody has claimed yet. On equal distance the image with the lower
/// midpoint wins. This is not a globally optimal matching: an early record can
/// claim an image a later record was closer to.
fn correlate_positional(
    mut records: Vec<MatchedRecord>,
    mut images: Vec<ImageRegion>,
) -> Vec<(BookingRecord, Option<Vec<u8>>)> {
    records.sort_by(|a, b| a.top.total_cmp(&b.top));
    images.sort_by(|a, b| midpoint(a).total_cmp(&midpoint(b)));

    let mut slots: Vec<Option<ImageRegion>> = images.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(records.len());

    for matched in records {
        let mut best: Option<(usize, f32)> = None;
        for (i, slot) in slots.iter().enumerate() {
            let Some(img) = slot else {
                continue;
            };
            let distance = (midpoint(img) - matched.top).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        let image = best
            .and_then(|(i, _)| slots[i].take())
            .map(|img| img.bytes);
        out.push((matched.record, image));
    }

    out
}

fn correlate_sequential(
    records: Vec<MatchedRecord>,
    images: Vec<ImageRegion>,
) -> Vec<(BookingRecord, Option<Vec<u8>>)> {
    let mut images = images.into_iter();
    records
        .into_iter()
        .map(|matched| (matched.record, images.next().map(|img| img.bytes)))
        .collect()
}

fn midpoint(img: &ImageRegion) -> f32 {
    img.midpoint.unwrap_or(f32::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, top: f32) -> MatchedRecord {
        MatchedRecord {
            record: BookingRecord {
                name: name.to_string(),
                booked_at: "01/02/2024 03:15:00 PM".to_string(),
                date_of_birth: "01/02/1990".to_string(),
                gender: "M".to_string(),
                brought_by: "MCSO".to_string(),
                charges: vec![],
            },
            top,
        }
    }

    fn at(tag: u8, mid: f32) -> ImageRegion {
        ImageRegion::positioned(vec![tag], mid)
    }

    fn names_and_tags(pairs: &[(BookingRecord, Option<Vec<u8>>)]) -> Vec<(String, Option<u8>)> {
        pairs
            .iter()
            .map(|(r, img)| (r.name.clone(), img.as_ref().map(|b| b[0])))
            .collect()
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(CorrelationMode::select(&[]), CorrelationMode::Sequential);
        assert_eq!(
            CorrelationMode::select(&[at(1, 5.0), at(2, 9.0)]),
            CorrelationMode::Positional
        );
        assert_eq!(
            CorrelationMode::select(&[at(1, 5.0), ImageRegion::unpositioned(vec![2])]),
            CorrelationMode::Sequential
        );
    }

    #[test]
    fn test_positional_nearest_regardless_of_image_order() {
        let expected = vec![("UPPER".to_string(), Some(2)), ("LOWER".to_string(), Some(1))];

        let pairs = correlate(
            vec![rec("UPPER", 100.0), rec("LOWER", 300.0)],
            vec![at(1, 310.0), at(2, 90.0)],
        );
        assert_eq!(names_and_tags(&pairs), expected);

        let pairs = correlate(
            vec![rec("UPPER", 100.0), rec("LOWER", 300.0)],
            vec![at(2, 90.0), at(1, 310.0)],
        );
        assert_eq!(names_and_tags(&pairs), expected);
    }

    #[test]
    fn test_positional_output_is_top_to_bottom() {
        let pairs = correlate(
            vec![rec("LOWER", 300.0), rec("UPPER", 100.0)],
            vec![at(1, 95.0), at(2, 305.0)],
        );
        assert_eq!(
            names_and_tags(&pairs),
            vec![("UPPER".to_string(), Some(1)), ("LOWER".to_string(), Some(2))]
        );
    }

    #[test]
    fn test_positional_greedy_not_optimal() {
        // UPPER claims the image at 150 even though LOWER sits right on it,
        // leaving LOWER the far image.
        let pairs = correlate(
            vec![rec("UPPER", 120.0), rec("LOWER", 150.0)],
            vec![at(1, 150.0), at(2, 10.0)],
        );
        assert_eq!(
            names_and_tags(&pairs),
            vec![("UPPER".to_string(), Some(1)), ("LOWER".to_string(), Some(2))]
        );
    }

    #[test]
    fn test_positional_tie_goes_to_lower_midpoint() {
        let pairs = correlate(vec![rec("MID", 100.0)], vec![at(2, 110.0), at(1, 90.0)]);
        assert_eq!(names_and_tags(&pairs), vec![("MID".to_string(), Some(1))]);
    }

    #[test]
    fn test_positional_more_records_than_images() {
        let pairs = correlate(
            vec![rec("A", 10.0), rec("B", 200.0), rec("C", 400.0)],
            vec![at(1, 390.0)],
        );
        // A is visited first and takes the only image
        assert_eq!(
            names_and_tags(&pairs),
            vec![
                ("A".to_string(), Some(1)),
                ("B".to_string(), None),
                ("C".to_string(), None)
            ]
        );
    }

    #[test]
    fn test_sequential_when_any_midpoint_missing() {
        let pairs = correlate(
            vec![rec("B", 300.0), rec("A", 100.0)],
            vec![at(1, 310.0), ImageRegion::unpositioned(vec![2])],
        );
        // document order kept, images by index
        assert_eq!(
            names_and_tags(&pairs),
            vec![("B".to_string(), Some(1)), ("A".to_string(), Some(2))]
        );
    }

    #[test]
    fn test_sequential_shortfall_and_surplus() {
        let pairs = correlate(
            vec![rec("A", 0.0), rec("B", 0.0)],
            vec![ImageRegion::unpositioned(vec![7])],
        );
        assert_eq!(
            names_and_tags(&pairs),
            vec![("A".to_string(), Some(7)), ("B".to_string(), None)]
        );

        let pairs = correlate(
            vec![rec("A", 0.0)],
            vec![
                ImageRegion::unpositioned(vec![7]),
                ImageRegion::unpositioned(vec![8]),
            ],
        );
        assert_eq!(names_and_tags(&pairs), vec![("A".to_string(), Some(7))]);
    }

    #[test]
    fn test_no_images_no_records() {
        assert!(correlate(vec![], vec![at(1, 1.0)]).is_empty());
        let pairs = correlate(vec![rec("A", 5.0)], vec![]);
        assert_eq!(names_and_tags(&pairs), vec![("A".to_string(), None)]);
    }
}
