//! Running review aggregate kept on each restaurant row.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingAggregate {
    pub sum: i64,
    pub count: i32,
}

impl RatingAggregate {
    pub fn new(sum: i64, count: i32) -> Self {
        Self { sum, count }
    }

    pub fn from_ratings<I: IntoIterator<Item = i32>>(ratings: I) -> Self {
        ratings.into_iter().fold(Self::default(), |agg, r| agg.add(r))
    }

    pub fn add(self, rating: i32) -> Self {
        Self {
            sum: self.sum + i64::from(rating),
            count: self.count + 1,
        }
    }

    /// Drops one rating. Saturates at empty so a stale row cannot go negative.
    pub fn remove(self, rating: i32) -> Self {
        if self.count <= 1 {
            return Self::default();
        }
        Self {
            sum: (self.sum - i64::from(rating)).max(0),
            count: self.count - 1,
        }
    }

    pub fn replace(self, old: i32, new: i32) -> Self {
        if self.count == 0 {
            return self.add(new);
        }
        Self {
            sum: self.sum - i64::from(old) + i64::from(new),
            count: self.count,
        }
    }

    /// Mean rounded to one decimal; 0 with no reviews.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.sum as f64 / f64::from(self.count);
        (mean * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_three_four_five_is_four() {
        let agg = RatingAggregate::from_ratings([3, 4, 5]);
        assert_eq!(agg.count, 3);
        assert_eq!(agg.average(), 4.0);

        let agg = agg.remove(5);
        assert_eq!(agg.count, 2);
        assert_eq!(agg.average(), 3.5);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let agg = RatingAggregate::from_ratings([5, 5, 4]);
        assert_eq!(agg.average(), 4.7);
    }

    #[test]
    fn incremental_updates_match_full_recompute() {
        let incremental = RatingAggregate::default()
            .add(2)
            .add(5)
            .replace(2, 4)
            .add(1)
            .remove(1);
        assert_eq!(incremental, RatingAggregate::from_ratings([4, 5]));
    }

    #[test]
    fn empty_aggregate_stays_empty() {
        let agg = RatingAggregate::default();
        assert_eq!(agg.average(), 0.0);
        assert_eq!(agg.remove(3), RatingAggregate::default());
        assert_eq!(RatingAggregate::new(4, 1).remove(4), RatingAggregate::default());
    }
}
