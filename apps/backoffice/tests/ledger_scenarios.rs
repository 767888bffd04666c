//! End-to-end scenarios through the command layer against an in-memory store.

use chrono::{NaiveDate, TimeZone, Utc};
use moda_backoffice::batch::BatchOptions;
use moda_backoffice::commands::{cart, customer, dashboard, import, sale, settlement};
use moda_backoffice::navigation::{Confirmation, ViewState};
use moda_backoffice::state::{AppConfig, DbState};
use moda_backoffice::AppState;
use moda_core::{Money, Product};
use moda_db::{Collection, Snapshot};

async fn app() -> AppState {
    let db = DbState::in_memory().await.unwrap();
    AppState::with_db(AppConfig::default(), db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = app().await;
    let db = &app.db;

    let ana = customer::save_customer(
        db,
        customer::CustomerInput {
            name: "Ana".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let dress = Product {
        id: "p-dress".to_string(),
        sku: "BS-VE-AZ-01-m".to_string(),
        name: "Vestido Azul".to_string(),
        category: "Vestido".to_string(),
        size: "M".to_string(),
        color: "Azul".to_string(),
        price: Money::from_major(150),
        cost: Money::from_major(60),
        stock: 5,
    };
    db.inner().products().insert(&dress).await.unwrap();

    app.nav.navigate(ViewState::NewSale);
    cart::add_to_cart(db, &app.cart, &dress.id, Some(2)).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();
    let created = sale::checkout_at(
        db,
        &app.cart,
        &app.nav,
        sale::CheckoutRequest {
            customer_id: Some(ana.id.clone()),
            installment_count: 3,
        },
        now,
    )
    .await
    .unwrap();

    assert_eq!(created.total, Money::from_major(300));
    let dues: Vec<NaiveDate> = created.installments.iter().map(|i| i.due_date).collect();
    assert_eq!(dues, vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1)]);
    assert!(created
        .installments
        .iter()
        .all(|i| i.value == Money::from_major(100)));
    assert_eq!(app.nav.current(), ViewState::Sales);
    assert_eq!(
        db.inner().products().get_by_id(&dress.id).await.unwrap().unwrap().stock,
        3
    );

    let first = created.installments[0].id.clone();
    let second = created.installments[1].id.clone();

    let after = settlement::record_payment(db, &created.id, &first, Money::from_major(100))
        .await
        .unwrap();
    assert!(after.installments[0].is_paid());

    let after = settlement::record_payment(db, &created.id, &second, Money::from_major(40))
        .await
        .unwrap();
    assert!(!after.installments[1].is_paid());
    assert_eq!(after.installments[1].remaining(), Money::from_major(60));

    // Before the second due date nothing is late.
    let view = dashboard::dashboard(db, date(2024, 2, 15)).await.unwrap();
    assert_eq!(view.summary.total_revenue, Money::from_major(300));
    assert_eq!(view.summary.total_paid, Money::from_major(140));
    assert_eq!(view.summary.total_receivable, Money::from_major(160));
    assert_eq!(view.summary.overdue_count, 0);
    assert!(!view.onboarding);

    let view = dashboard::dashboard(db, date(2024, 4, 2)).await.unwrap();
    assert_eq!(view.summary.overdue_count, 2);
    assert_eq!(view.overdue[0].installment_id, second);
    assert_eq!(view.overdue[0].remaining, Money::from_major(60));
}

#[tokio::test]
async fn test_csv_upsert_preserves_id() {
    let app = app().await;
    let db = &app.db;

    let existing = Product {
        id: "prod-original".to_string(),
        sku: "BS-CA-RE-01-m".to_string(),
        name: "Camisa Rede".to_string(),
        category: "Camisa".to_string(),
        size: "m".to_string(),
        color: "Rede".to_string(),
        price: Money::from_major(100),
        cost: Money::from_major(40),
        stock: 1,
    };
    db.inner().products().insert(&existing).await.unwrap();

    let file = "\
n;grupo;sku;nome;status;x;y;custo;preco;z;estoque;w;tamanho;cor;categoria
1;Camisa;BS-CA-RE-01-m;Camisa Rede;EM ESTOQUE;;;40,00;120,00;;;;m;Rede;Camisa
";
    let preview = import::preview_import(db, file).await.unwrap();
    assert!(preview.plan.to_add.is_empty());
    assert_eq!(preview.plan.to_update.len(), 1);
    assert_eq!(preview.plan.to_update[0].id, "prod-original");

    let report = import::apply_import(
        db,
        &preview.plan,
        BatchOptions::default(),
        Confirmation::Confirmed,
        |_| {},
    )
    .await
    .unwrap()
    .done()
    .unwrap();
    assert_eq!(report.succeeded, 1);

    let stored = db.inner().products().list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "prod-original");
    assert_eq!(stored[0].price, Money::from_major(120));
}

#[tokio::test]
async fn test_sales_subscription_sees_checkout() {
    let app = app().await;
    let db = &app.db;

    let mut sales = db.inner().subscribe(Collection::Sales);
    match sales.next().await.unwrap() {
        Some(Snapshot::Sales(list)) => assert!(list.is_empty()),
        other => panic!("unexpected first snapshot: {other:?}"),
    }

    let bia = customer::save_customer(
        db,
        customer::CustomerInput {
            name: "Bia".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let skirt = Product {
        id: "p-skirt".to_string(),
        sku: "BS-SA-PR-01-p".to_string(),
        name: "Saia Preta".to_string(),
        category: "Saia".to_string(),
        size: "P".to_string(),
        color: "Preta".to_string(),
        price: Money::from_major(80),
        cost: Money::zero(),
        stock: 1,
    };
    db.inner().products().insert(&skirt).await.unwrap();
    cart::add_to_cart(db, &app.cart, &skirt.id, None).await.unwrap();

    let created = sale::checkout(
        db,
        &app.cart,
        &app.nav,
        sale::CheckoutRequest {
            customer_id: Some(bia.id),
            installment_count: 1,
        },
    )
    .await
    .unwrap();

    match sales.next().await.unwrap() {
        Some(Snapshot::Sales(list)) => assert_eq!(list, vec![created]),
        other => panic!("unexpected snapshot: {other:?}"),
    }
}
