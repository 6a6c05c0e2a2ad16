use serde::Serialize;

use crate::domain::review::Review;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: usize,
    /// 0.0 when there are no reviews
    pub average: f64,
    /// Index 0 holds one-star reviews
    pub histogram: [usize; 5],
}

impl RatingSummary {
    /// Callers pass only the reviews that should count (published ones)
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut summary = RatingSummary::default();
        let mut total = 0u32;

        for review in reviews {
            let stars = review.rating.value();
            summary.histogram[usize::from(stars) - 1] += 1;
            total += u32::from(stars);
        }

        summary.count = reviews.len();
        if summary.count > 0 {
            summary.average = f64::from(total) / summary.count as f64;
        }
        summary
    }

    pub fn stars(&self, stars: u8) -> usize {
        match stars {
            1..=5 => self.histogram[usize::from(stars) - 1],
            _ => 0,
        }
    }
}
