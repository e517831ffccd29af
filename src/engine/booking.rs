use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, DriverDetails, PaymentStatus, RideStatus};
use crate::models::location::Location;
use crate::models::offer::RideOffer;

const DRIVER_NAMES: [&str; 4] = ["Rajesh", "Suresh", "Amit", "Vikram"];

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount: u32,
}

/// Authorizes and captures the fare before a provider is contacted.
pub trait PaymentGateway: Send + Sync {
    fn authorize(&self, amount: u32) -> impl Future<Output = Result<PaymentReceipt, AppError>> + Send;
}

/// Asks a ride provider to accept the trip.
pub trait RideDispatcher: Send + Sync {
    fn request_ride(
        &self,
        offer: &RideOffer,
        pickup: &Location,
        drop: &Location,
    ) -> impl Future<Output = Result<DriverDetails, AppError>> + Send;
}

#[derive(Debug, Clone)]
pub struct SimulatedPayment {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedPayment {
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
        }
    }
}

impl PaymentGateway for SimulatedPayment {
    async fn authorize(&self, amount: u32) -> Result<PaymentReceipt, AppError> {
        sleep(self.latency).await;

        let approved = rand::thread_rng().gen_bool(self.success_rate);
        if !approved {
            return Err(AppError::PaymentFailed);
        }

        Ok(PaymentReceipt {
            transaction_id: transaction_id(&mut rand::thread_rng()),
            amount,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedDispatcher {
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedDispatcher {
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }
}

impl RideDispatcher for SimulatedDispatcher {
    async fn request_ride(
        &self,
        _offer: &RideOffer,
        _pickup: &Location,
        _drop: &Location,
    ) -> Result<DriverDetails, AppError> {
        sleep(self.latency).await;

        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.failure_rate) {
            return Err(AppError::ProviderUnavailable);
        }
        Ok(driver_details(&mut rng))
    }
}

fn transaction_id<R: Rng>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("txn_{suffix}")
}

pub fn driver_details<R: Rng>(rng: &mut R) -> DriverDetails {
    let otp: u32 = rng.gen_range(1000..10000);
    let series: String = (0..2).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))).collect();
    let plate: u32 = rng.gen_range(1000..10000);

    DriverDetails {
        otp: otp.to_string(),
        driver_name: DRIVER_NAMES[rng.gen_range(0..DRIVER_NAMES.len())].to_string(),
        driver_rating: rng.gen_range(4.5..5.0),
        vehicle_number: format!("KA 01 {series} {plate}"),
    }
}

/// Payment first, then provider acceptance; either failure aborts with no booking.
pub async fn create_booking<P, D>(
    offer: &RideOffer,
    pickup: &Location,
    drop: &Location,
    payments: &P,
    dispatcher: &D,
) -> Result<Booking, AppError>
where
    P: PaymentGateway,
    D: RideDispatcher,
{
    let receipt = match payments.authorize(offer.price).await {
        Ok(receipt) => receipt,
        Err(err) => {
            warn!(offer_id = %offer.id, provider = %offer.provider, "payment declined");
            return Err(err);
        }
    };

    let driver = match dispatcher.request_ride(offer, pickup, drop).await {
        Ok(driver) => driver,
        Err(err) => {
            warn!(
                offer_id = %offer.id,
                transaction_id = %receipt.transaction_id,
                error = %err,
                "provider rejected ride; reporting refund"
            );
            return Err(AppError::ProviderUnavailable);
        }
    };

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        offer_id: offer.id,
        provider: offer.provider,
        category: offer.category,
        ride_name: offer.name.clone(),
        price: offer.price,
        status: RideStatus::Confirmed,
        pickup: pickup.clone(),
        drop: drop.clone(),
        payment_status: PaymentStatus::Captured,
        transaction_id: receipt.transaction_id,
        driver,
        current_location: None,
        created_at: now,
        updated_at: now,
    };

    info!(
        booking_id = %booking.id,
        provider = %booking.provider,
        price = booking.price,
        "booking confirmed"
    );

    Ok(booking)
}
