//! MongoDB access for the checkout service.

use crate::models::{
    Coupon, DiscountPurchase, MockExamRegistration, PersonalizedPlan, RecordStatus,
    ScholarshipApplication, Team,
};
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, Document},
    Client as MongoClient, Collection, Database,
};
use serde::Serialize;
use service_core::error::AppError;
use service_core::store;

#[derive(Clone)]
pub struct CheckoutDb {
    client: MongoClient,
    db: Database,
}

fn db_error(operation: &'static str) -> impl Fn(mongodb::error::Error) -> AppError {
    move |e| {
        tracing::error!(operation, "MongoDB operation failed: {}", e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    }
}

async fn insert_unique<T: Serialize + Send + Sync>(
    collection: &Collection<T>,
    record: &T,
    conflict: &'static str,
    operation: &'static str,
) -> Result<(), AppError> {
    match collection.insert_one(record, None).await {
        Ok(_) => Ok(()),
        Err(e) if store::is_duplicate_key(&e) => Err(AppError::Conflict(anyhow::anyhow!(conflict))),
        Err(e) => Err(db_error(operation)(e)),
    }
}

/// Applies a `$set` to the record whose `id_field` equals `id`; false when
/// nothing matched.
async fn set_by_id<T: Send + Sync>(
    collection: &Collection<T>,
    id_field: &str,
    id: &str,
    set: Document,
    operation: &'static str,
) -> Result<bool, AppError> {
    let result = collection
        .update_one(doc! { id_field: id }, doc! { "$set": set }, None)
        .await
        .map_err(db_error(operation))?;
    Ok(result.matched_count > 0)
}

impl CheckoutDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let (client, db) = store::connect(uri, database, "checkout-service").await?;
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for checkout-service");

        self.teams()
            .create_indexes(
                [
                    store::unique_index("teamId", "team_id_idx"),
                    store::index(doc! { "leaderEmail": 1 }, "leader_email_idx"),
                    store::ttl_index(),
                ],
                None,
            )
            .await
            .map_err(db_error("create team indexes"))?;

        self.registrations()
            .create_indexes(
                [
                    store::unique_index("registrationId", "registration_id_idx"),
                    store::index(doc! { "mockExamId": 1, "email": 1 }, "exam_email_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create registration indexes"))?;

        self.scholarships()
            .create_indexes(
                [
                    store::unique_index("scholarshipId", "scholarship_id_idx"),
                    store::index(doc! { "status": 1, "createdAt": -1 }, "status_created_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create scholarship indexes"))?;

        self.purchases()
            .create_indexes(
                [
                    store::unique_index("purchaseId", "purchase_id_idx"),
                    store::index(doc! { "couponCode": 1 }, "coupon_code_idx"),
                ],
                None,
            )
            .await
            .map_err(db_error("create purchase indexes"))?;

        self.plans()
            .create_indexes([store::unique_index("planId", "plan_id_idx")], None)
            .await
            .map_err(db_error("create personalized plan indexes"))?;

        self.coupons()
            .create_indexes([store::unique_index("code", "code_idx")], None)
            .await
            .map_err(db_error("create coupon indexes"))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        store::ping(&self.client).await
    }

    // Collection accessors

    pub fn teams(&self) -> Collection<Team> {
        self.db.collection("teams")
    }

    pub fn registrations(&self) -> Collection<MockExamRegistration> {
        self.db.collection("mock_registrations")
    }

    pub fn scholarships(&self) -> Collection<ScholarshipApplication> {
        self.db.collection("scholarships")
    }

    pub fn purchases(&self) -> Collection<DiscountPurchase> {
        self.db.collection("discount_purchases")
    }

    pub fn plans(&self) -> Collection<PersonalizedPlan> {
        self.db.collection("personalized_plans")
    }

    pub fn coupons(&self) -> Collection<Coupon> {
        self.db.collection("coupons")
    }

    // Teams

    pub async fn insert_team(&self, team: &Team) -> Result<(), AppError> {
        store::insert_expiring(&self.teams(), team, team.expires_at)
            .await
            .map_err(|e| {
                tracing::error!(team_id = %team.team_id, "Failed to insert team: {}", e);
                e
            })
    }

    pub async fn find_team(&self, team_id: &str) -> Result<Option<Team>, AppError> {
        self.teams()
            .find_one(doc! { "teamId": team_id }, None)
            .await
            .map_err(db_error("find team"))
    }

    pub async fn set_team_fields(&self, team_id: &str, set: Document) -> Result<bool, AppError> {
        set_by_id(&self.teams(), "teamId", team_id, set, "update team").await
    }

    // Mock exam registrations

    pub async fn insert_registration(
        &self,
        registration: &MockExamRegistration,
    ) -> Result<(), AppError> {
        insert_unique(
            &self.registrations(),
            registration,
            "Registration already exists",
            "insert registration",
        )
        .await
    }

    pub async fn find_registration(
        &self,
        registration_id: &str,
    ) -> Result<Option<MockExamRegistration>, AppError> {
        self.registrations()
            .find_one(doc! { "registrationId": registration_id }, None)
            .await
            .map_err(db_error("find registration"))
    }

    pub async fn set_registration_fields(
        &self,
        registration_id: &str,
        set: Document,
    ) -> Result<bool, AppError> {
        set_by_id(
            &self.registrations(),
            "registrationId",
            registration_id,
            set,
            "update registration",
        )
        .await
    }

    // Scholarship applications

    pub async fn insert_scholarship(
        &self,
        application: &ScholarshipApplication,
    ) -> Result<(), AppError> {
        insert_unique(
            &self.scholarships(),
            application,
            "Scholarship application already exists",
            "insert scholarship",
        )
        .await
    }

    pub async fn find_scholarship(
        &self,
        scholarship_id: &str,
    ) -> Result<Option<ScholarshipApplication>, AppError> {
        self.scholarships()
            .find_one(doc! { "scholarshipId": scholarship_id }, None)
            .await
            .map_err(db_error("find scholarship"))
    }

    pub async fn set_scholarship_fields(
        &self,
        scholarship_id: &str,
        set: Document,
    ) -> Result<bool, AppError> {
        set_by_id(
            &self.scholarships(),
            "scholarshipId",
            scholarship_id,
            set,
            "update scholarship",
        )
        .await
    }

    // Discount purchases

    pub async fn insert_purchase(&self, purchase: &DiscountPurchase) -> Result<(), AppError> {
        insert_unique(
            &self.purchases(),
            purchase,
            "Purchase already exists",
            "insert purchase",
        )
        .await
    }

    pub async fn find_purchase(
        &self,
        purchase_id: &str,
    ) -> Result<Option<DiscountPurchase>, AppError> {
        self.purchases()
            .find_one(doc! { "purchaseId": purchase_id }, None)
            .await
            .map_err(db_error("find purchase"))
    }

    pub async fn set_purchase_fields(
        &self,
        purchase_id: &str,
        set: Document,
    ) -> Result<bool, AppError> {
        set_by_id(&self.purchases(), "purchaseId", purchase_id, set, "update purchase").await
    }

    /// Applies `set` unless the purchase is already paid, returning the
    /// purchase as it was before the update. `None` means no unpaid purchase
    /// matched, so concurrent deliveries of one event settle it once.
    pub async fn settle_purchase(
        &self,
        purchase_id: &str,
        set: Document,
    ) -> Result<Option<DiscountPurchase>, AppError> {
        self.purchases()
            .find_one_and_update(
                doc! { "purchaseId": purchase_id, "status": { "$ne": RecordStatus::Paid.as_str() } },
                doc! { "$set": set },
                None,
            )
            .await
            .map_err(db_error("settle purchase"))
    }

    // Personalized plans

    pub async fn insert_plan(&self, plan: &PersonalizedPlan) -> Result<(), AppError> {
        insert_unique(&self.plans(), plan, "Plan already exists", "insert plan").await
    }

    pub async fn find_plan(&self, plan_id: &str) -> Result<Option<PersonalizedPlan>, AppError> {
        self.plans()
            .find_one(doc! { "planId": plan_id }, None)
            .await
            .map_err(db_error("find plan"))
    }

    pub async fn set_plan_fields(&self, plan_id: &str, set: Document) -> Result<bool, AppError> {
        set_by_id(&self.plans(), "planId", plan_id, set, "update plan").await
    }

    // Coupons

    pub async fn insert_coupon(&self, coupon: &Coupon) -> Result<(), AppError> {
        insert_unique(
            &self.coupons(),
            coupon,
            "Coupon already exists",
            "insert coupon",
        )
        .await
    }

    pub async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, AppError> {
        self.coupons()
            .find_one(doc! { "code": code }, None)
            .await
            .map_err(db_error("find coupon"))
    }

    pub async fn record_coupon_redemption(&self, code: &str) -> Result<(), AppError> {
        self.coupons()
            .update_one(doc! { "code": code }, doc! { "$inc": { "redemptions": 1 } }, None)
            .await
            .map_err(db_error("record coupon redemption"))?;
        Ok(())
    }
}

/// `$set` fields shared by every webhook settlement.
pub fn settlement_fields(
    status: &str,
    timestamp_field: &str,
    session_id: &str,
    now: DateTime<Utc>,
) -> Document {
    let now = service_core::time_format::format(&now);
    doc! {
        "status": status,
        timestamp_field: now.as_str(),
        "stripeCheckoutSessionId": session_id,
    }
}
