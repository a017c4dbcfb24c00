//! CRUD operations for [`Review`] records, their like-sets, and their reply
//! sequences.
//!
//! The like-toggle and reply-append are the only read-modify-write paths in
//! the system. Both run as a single statement or a single transaction against
//! one review, so concurrent calls against the same record serialize at the
//! storage boundary instead of losing updates.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{time_col, uuid_col, Database};
use crate::error::{Result, StoreError};
use crate::models::{Review, ReviewReply};

impl Database {
    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    /// Insert a new review with an empty like-set and reply sequence.
    ///
    /// Nothing prevents the same user from reviewing the same product more
    /// than once; that looseness is inherited deliberately.
    pub fn insert_review(&self, review: &Review) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reviews (id, product_id, user_id, rating, sustainability_rating,
                                  comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                review.id.to_string(),
                review.product_id.to_string(),
                review.user_id.to_string(),
                review.rating,
                review.sustainability_rating,
                review.comment,
                review.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single review by id.
    pub fn get_review(&self, id: Uuid) -> Result<Review> {
        self.conn()
            .query_row(
                "SELECT id, product_id, user_id, rating, sustainability_rating, comment, created_at
                 FROM reviews WHERE id = ?1",
                params![id.to_string()],
                row_to_review,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List a product's reviews in submission order.
    pub fn list_reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, product_id, user_id, rating, sustainability_rating, comment, created_at
             FROM reviews WHERE product_id = ?1 ORDER BY rowid ASC",
        )?;

        let rows = stmt.query_map(params![product_id.to_string()], row_to_review)?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    // ------------------------------------------------------------------
    // Likes
    // ------------------------------------------------------------------

    /// Toggle `user_id`'s membership in the review's like-set and return the
    /// resulting set, most recent like first.
    ///
    /// The existence check, the membership flip, and the re-read all happen
    /// inside one transaction: the current membership decides the outcome, so
    /// two racing toggles must serialize or one update is lost.
    pub fn toggle_like(&mut self, review_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>> {
        let tx = self.conn_mut().transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM reviews WHERE id = ?1)",
                params![review_id.to_string()],
                |row| row.get(0),
            )?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        let removed = tx.execute(
            "DELETE FROM review_likes WHERE review_id = ?1 AND user_id = ?2",
            params![review_id.to_string(), user_id.to_string()],
        )?;

        if removed == 0 {
            tx.execute(
                "INSERT INTO review_likes (review_id, user_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    review_id.to_string(),
                    user_id.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }

        let likes = query_likes(&tx, review_id)?;
        tx.commit()?;
        Ok(likes)
    }

    /// Read a review's like-set, most recent like first.
    pub fn likes_for_review(&self, review_id: Uuid) -> Result<Vec<Uuid>> {
        query_likes(self.conn(), review_id)
    }

    // ------------------------------------------------------------------
    // Replies
    // ------------------------------------------------------------------

    /// Append a reply to a review. The AUTOINCREMENT sequence column fixes
    /// display order to submission order.
    pub fn append_reply(&self, reply: &ReviewReply) -> Result<()> {
        self.conn().execute(
            "INSERT INTO review_replies (id, review_id, user_id, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reply.id.to_string(),
                reply.review_id.to_string(),
                reply.user_id.to_string(),
                reply.comment,
                reply.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List a review's replies in submission order.
    pub fn replies_for_review(&self, review_id: Uuid) -> Result<Vec<ReviewReply>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, review_id, user_id, comment, created_at
             FROM review_replies WHERE review_id = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![review_id.to_string()], row_to_reply)?;

        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }
}

fn query_likes(conn: &rusqlite::Connection, review_id: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM review_likes WHERE review_id = ?1 ORDER BY rowid DESC",
    )?;

    let rows = stmt.query_map(params![review_id.to_string()], |row| {
        let user_str: String = row.get(0)?;
        uuid_col(0, &user_str)
    })?;

    let mut likes = Vec::new();
    for row in rows {
        likes.push(row?);
    }
    Ok(likes)
}

/// Map a `rusqlite::Row` to a [`Review`].
fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    let id_str: String = row.get(0)?;
    let product_str: String = row.get(1)?;
    let user_str: String = row.get(2)?;
    let created_str: String = row.get(6)?;

    Ok(Review {
        id: uuid_col(0, &id_str)?,
        product_id: uuid_col(1, &product_str)?,
        user_id: uuid_col(2, &user_str)?,
        rating: row.get(3)?,
        sustainability_rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: time_col(6, &created_str)?,
    })
}

/// Map a `rusqlite::Row` to a [`ReviewReply`].
fn row_to_reply(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewReply> {
    let id_str: String = row.get(0)?;
    let review_str: String = row.get(1)?;
    let user_str: String = row.get(2)?;
    let created_str: String = row.get(4)?;

    Ok(ReviewReply {
        id: uuid_col(0, &id_str)?,
        review_id: uuid_col(1, &review_str)?,
        user_id: uuid_col(2, &user_str)?,
        comment: row.get(3)?,
        created_at: time_col(4, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ecowear_shared::Role;

    use crate::models::User;

    fn seeded_buyer(db: &Database, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
            role: Role::Buyer,
            is_verified: false,
            created_at: Utc::now(),
        };
        db.create_user(&user).unwrap();
        user
    }

    fn seeded_review(db: &Database, author: Uuid) -> Review {
        let review = Review {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            user_id: author,
            rating: 4,
            sustainability_rating: 5,
            comment: "Holding up well after many washes.".to_string(),
            created_at: Utc::now(),
        };
        db.insert_review(&review).unwrap();
        review
    }

    #[test]
    fn reviews_list_in_submission_order() {
        let db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db, "Ada");
        let product_id = Uuid::new_v4();

        for comment in ["first", "second", "third"] {
            db.insert_review(&Review {
                id: Uuid::new_v4(),
                product_id,
                user_id: buyer.id,
                rating: 5,
                sustainability_rating: 4,
                comment: comment.to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        }

        let listed = db.list_reviews_for_product(product_id).unwrap();
        let comments: Vec<&str> = listed.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, ["first", "second", "third"]);
    }

    #[test]
    fn toggle_like_pair_returns_to_empty() {
        let mut db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db, "Ada");
        let review = seeded_review(&db, buyer.id);
        let liker = Uuid::new_v4();

        let likes = db.toggle_like(review.id, liker).unwrap();
        assert_eq!(likes, vec![liker]);

        let likes = db.toggle_like(review.id, liker).unwrap();
        assert!(likes.is_empty());
    }

    #[test]
    fn like_set_never_holds_duplicates() {
        let mut db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db, "Ada");
        let review = seeded_review(&db, buyer.id);

        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        db.toggle_like(review.id, u1).unwrap();
        db.toggle_like(review.id, u2).unwrap();
        // u1 unlikes, then likes again: still exactly one entry for u1.
        db.toggle_like(review.id, u1).unwrap();
        let likes = db.toggle_like(review.id, u1).unwrap();

        assert_eq!(likes.len(), 2);
        assert_eq!(likes.iter().filter(|id| **id == u1).count(), 1);
        // Most recent like first.
        assert_eq!(likes[0], u1);
    }

    #[test]
    fn toggle_like_on_missing_review_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.toggle_like(Uuid::new_v4(), Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn replies_preserve_submission_order() {
        let db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db, "Ada");
        let seller = seeded_buyer(&db, "Green Threads Co");
        let review = seeded_review(&db, buyer.id);

        for comment in ["A", "B"] {
            db.append_reply(&ReviewReply {
                id: Uuid::new_v4(),
                review_id: review.id,
                user_id: seller.id,
                comment: comment.to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        }

        let replies = db.replies_for_review(review.id).unwrap();
        let comments: Vec<&str> = replies.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, ["A", "B"]);
    }
}
