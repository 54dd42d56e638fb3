//! Book catalog attributes.

use crate::define_choice;

define_choice!(
    /// Literary genre of a book.
    Genre {
        Fiction => ("FICTION", "Fiction"),
        NonFiction => ("NON_FICTION", "Non-Fiction"),
        SciFi => ("SCI_FI", "Science Fiction"),
        Fantasy => ("FANTASY", "Fantasy"),
        Mystery => ("MYSTERY", "Mystery"),
        Romance => ("ROMANCE", "Romance"),
        Thriller => ("THRILLER", "Thriller"),
        Biography => ("BIOGRAPHY", "Biography"),
        History => ("HISTORY", "History"),
        SelfHelp => ("SELF_HELP", "Self Help"),
        Science => ("SCIENCE", "Science"),
        Technology => ("TECHNOLOGY", "Technology"),
        Business => ("BUSINESS", "Business"),
        Children => ("CHILDREN", "Children's Books"),
        YoungAdult => ("YOUNG_ADULT", "Young Adult"),
        Poetry => ("POETRY", "Poetry"),
        Drama => ("DRAMA", "Drama"),
        Classic => ("CLASSIC", "Classic Literature"),
        Horror => ("HORROR", "Horror"),
        Comics => ("COMICS", "Comics & Graphic Novels"),
    }
);

define_choice!(
    /// Physical or digital format of a book.
    BookFormat {
        Hardcover => ("HARDCOVER", "Hardcover"),
        Paperback => ("PAPERBACK", "Paperback"),
        Ebook => ("EBOOK", "E-Book"),
        Audiobook => ("AUDIOBOOK", "Audiobook"),
    }
);

impl Default for BookFormat {
    fn default() -> Self {
        Self::Paperback
    }
}

define_choice!(
    /// Condition of a copy.
    BookCondition {
        New => ("NEW", "New"),
        LikeNew => ("LIKE_NEW", "Like New"),
        VeryGood => ("VERY_GOOD", "Very Good"),
        Good => ("GOOD", "Good"),
        Acceptable => ("ACCEPTABLE", "Acceptable"),
    }
);

impl Default for BookCondition {
    fn default() -> Self {
        Self::New
    }
}

define_choice!(
    /// Merchandising badge shown on a book card.
    BookLabel {
        NewArrival => ("N", "NEW ARRIVAL"),
        Bestseller => ("B", "BESTSELLER"),
        SpecialOffer => ("S", "SPECIAL OFFER"),
        PreOrder => ("P", "PRE-ORDER"),
    }
);

impl BookLabel {
    /// CSS modifier used by the badge markup.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::NewArrival => "badge-new",
            Self::Bestseller => "badge-bestseller",
            Self::SpecialOffer => "badge-offer",
            Self::PreOrder => "badge-preorder",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_codes_parse_back() {
        assert_eq!(Genre::ALL.len(), 20);
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), *genre);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = "PULP".parse::<Genre>().unwrap_err();
        assert_eq!(err.kind, "Genre");
        assert_eq!(err.value, "PULP");
    }

    #[test]
    fn test_defaults_match_new_stock() {
        assert_eq!(BookFormat::default(), BookFormat::Paperback);
        assert_eq!(BookCondition::default(), BookCondition::New);
    }

    #[test]
    fn test_label_display_uses_badge_text() {
        assert_eq!(BookLabel::PreOrder.to_string(), "PRE-ORDER");
        assert_eq!(BookLabel::Bestseller.as_str(), "B");
    }

    #[test]
    fn test_serde_uses_storage_code() {
        let json = serde_json::to_string(&BookFormat::Ebook).unwrap();
        assert_eq!(json, "\"EBOOK\"");
        let parsed: BookCondition = serde_json::from_str("\"LIKE_NEW\"").unwrap();
        assert_eq!(parsed, BookCondition::LikeNew);
    }
}
