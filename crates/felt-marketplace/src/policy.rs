//! Guard predicates shared by both rating directions and by conversation
//! materialization.

use felt_types::*;

/// Decide whether `rater` may rate `ratee` for `listing`.
///
/// The listing must be Completed, one side must be the listing's player and
/// the other a backer who discussed the listing with them (`has_deal_thread`).
/// Returns the rating direction so callers can check aspects.
pub fn check_rating(
    listing: &Listing,
    rater: &UserProfile,
    ratee: &UserProfile,
    input: &NewRating,
    has_deal_thread: bool,
) -> Result<RatingDirection> {
    if input.listing != listing.id || input.rater != rater.id || input.ratee != ratee.id {
        return Err(FeltError::validation(
            "rating",
            "rater, ratee and listing must match the rating",
        ));
    }
    if listing.status != ListingStatus::Completed {
        return Err(FeltError::validation(
            "listing",
            format!("ratings open once the listing is Completed, it is {}", listing.status),
        ));
    }

    let direction = RatingDirection::between(rater.role, ratee.role).ok_or_else(|| {
        FeltError::unauthorized(format!(
            "a {} cannot rate a {}",
            rater.role, ratee.role
        ))
    })?;

    let player = match direction {
        RatingDirection::PlayerRatesBacker => rater,
        RatingDirection::BackerRatesPlayer => ratee,
    };
    if player.id != listing.owner {
        return Err(FeltError::unauthorized(format!(
            "{} does not own listing {}",
            player.username, listing.id
        )));
    }
    if !has_deal_thread {
        return Err(FeltError::unauthorized(format!(
            "{} and {} never discussed listing {}",
            rater.username, ratee.username, listing.id
        )));
    }

    input.validate()?;
    input.validate_aspects(direction)?;
    Ok(direction)
}

/// Decide whether a new conversation about `listing` may be started between
/// `a` and `b`. Existing conversations are not subject to this check.
pub fn check_new_conversation(listing: &Listing, a: &UserId, b: &UserId) -> Result<()> {
    if &listing.owner != a && &listing.owner != b {
        return Err(FeltError::validation(
            "listing",
            "conversations about a listing must include its owner",
        ));
    }
    if listing.status != ListingStatus::Active {
        return Err(FeltError::validation(
            "listing",
            format!("listing is {}, not open for new conversations", listing.status),
        ));
    }
    Ok(())
}
