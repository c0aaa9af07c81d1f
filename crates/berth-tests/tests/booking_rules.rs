use berth_core::{BerthType, Gender, PassengerFields, TicketStatus};
use berth_tests::TestCtxBuilder;
use eyre::Result;

mod util;
use util::{adult, book_adults, fill_confirmed_and_rac};

#[tokio::test]
#[ntest::timeout(20_000)]
async fn seniors_and_parents_get_lower_berths() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.with_seed(3).build().await?;

    let passengers = [
        PassengerFields::new("Senior", 60, Gender::Male, false),
        PassengerFields::new("Senior", 84, Gender::Female, false),
        PassengerFields::new("Parent", 31, Gender::Female, true),
    ];
    for passenger in &passengers {
        let ticket = ctx.api.book_ticket(passenger).await?.result?;
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(
            ticket.berth_type(),
            Some(BerthType::LowerBerth),
            "{ticket} must get a lower berth while one is free."
        );
    }

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn priority_falls_back_once_lower_berths_are_gone() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    // 18 lower berths in 9 compartments
    for i in 0..18 {
        let ticket = ctx
            .api
            .book_ticket(&PassengerFields::new(format!("Senior {i}"), 70, Gender::Male, false))
            .await?
            .result?;
        assert_eq!(ticket.berth_type(), Some(BerthType::LowerBerth));
    }

    let ticket = ctx
        .api
        .book_ticket(&PassengerFields::new("Late senior", 70, Gender::Male, false))
        .await?
        .result?;
    assert_eq!(ticket.status, TicketStatus::Confirmed);
    assert!(matches!(
        ticket.berth_type(),
        Some(BerthType::MiddleBerth | BerthType::UpperBerth | BerthType::SideUpper)
    ));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn same_seed_same_berths() -> Result<()> {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let ctx = TestCtxBuilder::from_env()?
            .with_seed(0xB3_47)
            .with_workers(1)
            .build()
            .await?;
        let tickets = book_adults(&ctx.api, 20, TicketStatus::Confirmed).await?;
        runs.push(tickets.iter().map(|t| t.berth_number()).collect::<Vec<_>>());
        ctx.finish().await;
    }
    assert_eq!(runs[0], runs[1]);
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn invalid_passengers_are_rejected() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    let invalid = [
        PassengerFields::new("   ", 30, Gender::Male, false),
        PassengerFields::new("x".repeat(101), 30, Gender::Male, false),
        PassengerFields::new("Ghost", -1, Gender::Male, false),
        PassengerFields {
            gender: "X".into(),
            ..adult("Unknown")
        },
    ];
    for passenger in &invalid {
        let response = ctx.api.book_ticket(passenger).await?;
        assert_eq!(response.status, 400, "{passenger:?} must be rejected.");
        assert!(response.result.is_err());
    }

    for body in ["", "{", r#"{"name": "No age"}"#] {
        let response = ctx.api.book_raw(body).await?;
        assert_eq!(response.status, 400, "Body {body:?} must be rejected.");
    }

    assert!(ctx.api.list_tickets().await?.result?.is_empty());
    assert_eq!(ctx.api.available().await?.result?.available, Some(63));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn restamping_is_configurable() -> Result<()> {
    for restamp in [true, false] {
        let ctx = TestCtxBuilder::from_env()?.with_restamp(restamp).build().await?;

        let (confirmed, _) = fill_confirmed_and_rac(&ctx.api).await?;
        let waitlisted = ctx.api.book_ticket(&adult("waiting")).await?.result?;
        ctx.api.cancel_ticket(confirmed[0].id).await?.result?;

        let promoted = ctx.api.get_ticket(waitlisted.id).await?.result?;
        assert_eq!(promoted.status, TicketStatus::Rac);
        assert_eq!(
            promoted.created_at != waitlisted.created_at,
            restamp,
            "Promotion to RAC with restamp = {restamp}"
        );

        ctx.finish().await;
    }
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn children_can_count_against_confirmed_tier() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_children_hold_confirmed(true)
        .build()
        .await?;

    let child = ctx
        .api
        .book_ticket(&PassengerFields::new("Kid", 2, Gender::Male, false))
        .await?
        .result?;
    assert_eq!(child.status, TicketStatus::Confirmed);
    assert_eq!(child.berth, None);
    assert_eq!(ctx.api.available().await?.result?.available, Some(62));

    book_adults(&ctx.api, 62, TicketStatus::Confirmed).await?;
    let next = ctx.api.book_ticket(&adult("first RAC")).await?.result?;
    assert_eq!(next.status, TicketStatus::Rac);

    ctx.finish().await;
    Ok(())
}
