use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::domain::card::{CardBrand, CardDetails, CardForm};
use crate::domain::context::{BookingId, ContextView, OtpConfirmation, WizardContext};
use crate::domain::format::Currency;
use crate::domain::otp::{OTP_LENGTH, OtpCode};
use crate::domain::ports::{CardSubmission, OtpSubmission, PaymentServiceRef};
use crate::domain::reservation::{ReservationForm, ReservationSummary};
use crate::domain::step::Step;
use crate::domain::validation::{Field, ValidationErrors};
use crate::error::{Result, WizardError};

const CARD_FAILED: &str = "Failed to submit card. Please try again.";
const OTP_FAILED: &str = "Failed to verify code. Please try again.";
const RESEND_FAILED: &str = "Failed to resend code. Please try again.";

/// Form data owned by the current step. Replaced wholesale on every step change.
#[derive(Debug, Clone, PartialEq)]
pub enum StepForm {
    Reservation(ReservationForm),
    Checkout,
    Payment(CardForm),
    Verification(OtpCode),
    Complete,
}

impl StepForm {
    fn fresh(step: Step) -> Self {
        match step {
            Step::Reservation => StepForm::Reservation(ReservationForm::new()),
            Step::Checkout => StepForm::Checkout,
            Step::Payment => StepForm::Payment(CardForm::new()),
            Step::Verification => StepForm::Verification(OtpCode::new()),
            Step::Complete => StepForm::Complete,
        }
    }

    pub fn step(&self) -> Step {
        match self {
            StepForm::Reservation(_) => Step::Reservation,
            StepForm::Checkout => Step::Checkout,
            StepForm::Payment(_) => Step::Payment,
            StepForm::Verification(_) => Step::Verification,
            StepForm::Complete => Step::Complete,
        }
    }

    /// Runs the step's validator. Steps without input never report errors.
    pub fn validate(&self) -> ValidationErrors {
        match self {
            StepForm::Reservation(form) => form.validate(),
            StepForm::Payment(form) => form.validate(),
            StepForm::Verification(code) => code.validate(),
            StepForm::Checkout | StepForm::Complete => ValidationErrors::new(),
        }
    }
}

/// Marks a request as outstanding for the step that issued it.
///
/// Set by `claim` and cleared when the returned guard is dropped, so a
/// submission that is abandoned or cancelled mid-dispatch releases the step
/// just like one whose outcome was applied.
#[derive(Debug, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn claim(&self) -> InFlightGuard {
        self.0.store(true, Ordering::Release);
        InFlightGuard(Arc::clone(&self.0))
    }
}

#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Mutable state of the step on screen: its form, the errors exposed to the
/// presentation layer, and the in-flight flags.
#[derive(Debug)]
pub struct StepState {
    pub form: StepForm,
    pub errors: ValidationErrors,
    pub submitting: InFlight,
    pub resending: InFlight,
}

impl StepState {
    fn enter(step: Step) -> Self {
        Self {
            form: StepForm::fresh(step),
            errors: ValidationErrors::new(),
            submitting: InFlight::default(),
            resending: InFlight::default(),
        }
    }
}

/// Result of a user action on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to the given step.
    Advanced(Step),
    /// Moved back to the given step.
    Returned(Step),
    /// Validation failed; errors are exposed and nothing was sent.
    Invalid,
    /// The payment service call failed; field values are kept.
    Failed,
    /// The action is disabled in the current state.
    Unavailable,
    /// A submission for this step is already in flight.
    Busy,
    /// A response arrived for a step the user already left.
    Stale,
    /// A fresh code was issued and the cells were reset.
    CodeResent,
}

/// Identifies which step (and which visit to it) a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    step: Step,
}

/// What is sent to the payment service, plus what the step contributes to the
/// context once the service accepts it.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    Card {
        card: CardDetails,
        body: CardSubmission,
    },
    Otp(OtpSubmission),
    Resend,
}

/// A submission that has been validated and marked in flight but not yet sent.
///
/// Dispatching does not borrow the controller, so the presentation layer keeps
/// handling input (including a second submit, which is refused) while the
/// network call is outstanding. Dropping it, or its outcome, without calling
/// `WizardController::complete` releases the step for another attempt.
pub struct Submission {
    ticket: Ticket,
    request: ServiceRequest,
    service: PaymentServiceRef,
    guard: InFlightGuard,
}

impl Submission {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn request(&self) -> &ServiceRequest {
        &self.request
    }

    pub async fn dispatch(self) -> SubmissionOutcome {
        let result = match &self.request {
            ServiceRequest::Card { body, .. } => self.service.submit_card(body).await,
            ServiceRequest::Otp(body) => self.service.submit_otp(body).await,
            ServiceRequest::Resend => self.service.resend_otp().await,
        };
        SubmissionOutcome {
            ticket: self.ticket,
            request: self.request,
            result,
            guard: self.guard,
        }
    }
}

/// The service's answer, to be handed back to `WizardController::complete`.
#[derive(Debug)]
pub struct SubmissionOutcome {
    ticket: Ticket,
    request: ServiceRequest,
    result: Result<()>,
    guard: InFlightGuard,
}

pub enum SubmitStart {
    /// The service must be called; dispatch it and pass the outcome to `complete`.
    Dispatch(Submission),
    /// The action settled locally.
    Settled(Transition),
}

/// Serializable view of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub step: Step,
    pub title: &'static str,
    pub fields: BTreeMap<Field, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<CardBrand>,
    pub errors: ValidationErrors,
    pub submitting: bool,
    pub resending: bool,
    pub can_submit: bool,
    pub context: ContextView,
}

/// The checkout state machine.
///
/// Steps run strictly `Reservation → Checkout → Payment → Verification →
/// Complete`. A forward transition validates the current step, stays put on
/// errors, and otherwise extends the context (calling the payment service for
/// Payment and Verification) before moving on. The only backward move is from
/// Verification to a fresh Reservation.
pub struct WizardController {
    service: PaymentServiceRef,
    currency: Currency,
    state: StepState,
    context: WizardContext,
    epoch: u64,
}

impl WizardController {
    pub fn new(service: PaymentServiceRef) -> Self {
        Self {
            service,
            currency: Currency::default(),
            state: StepState::enter(Step::Reservation),
            context: WizardContext::new(),
            epoch: 0,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn step(&self) -> Step {
        self.state.form.step()
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    pub fn context(&self) -> &WizardContext {
        &self.context
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.state.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.state.submitting.is_set()
    }

    pub fn is_resending(&self) -> bool {
        self.state.resending.is_set()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn reservation_form(&self) -> Option<&ReservationForm> {
        match &self.state.form {
            StepForm::Reservation(form) => Some(form),
            _ => None,
        }
    }

    pub fn card_form(&self) -> Option<&CardForm> {
        match &self.state.form {
            StepForm::Payment(form) => Some(form),
            _ => None,
        }
    }

    pub fn otp(&self) -> Option<&OtpCode> {
        match &self.state.form {
            StepForm::Verification(code) => Some(code),
            _ => None,
        }
    }

    /// Reservation fields for the review screens, placeholders when absent.
    pub fn summary(&self) -> ReservationSummary {
        self.context.view(self.currency).reservation
    }

    /// Whether the forward action is currently enabled.
    pub fn can_submit(&self) -> bool {
        if self.is_submitting() {
            return false;
        }
        match &self.state.form {
            StepForm::Checkout => self.context.reservation().is_some(),
            StepForm::Complete => false,
            StepForm::Verification(code) => code.is_complete() && code.validate().is_empty(),
            form => form.validate().is_empty(),
        }
    }

    /// Applies a field edit to the current step. Malformed values and fields
    /// that do not belong to the current step are silently refused.
    pub fn input(&mut self, field: Field, value: &str) -> bool {
        let accepted = match (&mut self.state.form, field) {
            (StepForm::Reservation(form), Field::RoomType) => form.set_room_type(value),
            (StepForm::Reservation(form), Field::CheckIn) => form.set_check_in(value),
            (StepForm::Reservation(form), Field::CheckOut) => form.set_check_out(value),
            (StepForm::Reservation(form), Field::Guests) => form.set_guests(value),
            (StepForm::Reservation(form), Field::Amount) => form.set_amount(value),
            (StepForm::Payment(form), Field::CardNumber) => form.set_number(value),
            (StepForm::Payment(form), Field::CardName) => form.set_holder_name(value),
            (StepForm::Payment(form), Field::Expiry) => form.set_expiry(value),
            (StepForm::Payment(form), Field::Cvv) => form.set_cvv(value),
            (StepForm::Verification(code), Field::Otp) => {
                code.paste(value);
                true
            }
            _ => false,
        };
        if accepted {
            self.state.errors.clear_field(field);
        }
        accepted
    }

    pub fn enter_otp_digit(&mut self, index: usize, value: &str) -> bool {
        let StepForm::Verification(code) = &mut self.state.form else {
            return false;
        };
        let accepted = code.enter(index, value);
        if accepted {
            self.state.errors.clear_field(Field::Otp);
        }
        accepted
    }

    pub fn otp_backspace(&mut self, index: usize) -> bool {
        let StepForm::Verification(code) = &mut self.state.form else {
            return false;
        };
        let filled = code.cell(index).is_some();
        let accepted = code.backspace(index);
        if accepted && filled {
            self.state.errors.clear_field(Field::Otp);
        }
        accepted
    }

    pub fn paste_otp(&mut self, text: &str) -> bool {
        self.input(Field::Otp, text)
    }

    /// Validates the current step and either settles the transition locally or
    /// hands back a `Submission` for the payment service.
    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.is_submitting() {
            debug!(step = %self.step(), "submit ignored, already in flight");
            return SubmitStart::Settled(Transition::Busy);
        }

        let errors = self.state.form.validate();
        if !errors.is_empty() {
            debug!(step = %self.step(), fields = errors.len(), "step rejected by validation");
            self.state.errors = errors;
            return SubmitStart::Settled(Transition::Invalid);
        }

        let request = match &self.state.form {
            StepForm::Reservation(form) => {
                let transition = match form.to_reservation() {
                    Ok(reservation) => {
                        let extended = self.context.with_reservation(reservation);
                        self.extend_and_advance(extended, Step::Checkout)
                    }
                    Err(errors) => {
                        self.state.errors = errors;
                        Transition::Invalid
                    }
                };
                return SubmitStart::Settled(transition);
            }
            StepForm::Checkout => {
                if self.context.reservation().is_none() {
                    return SubmitStart::Settled(Transition::Unavailable);
                }
                return SubmitStart::Settled(self.advance(Step::Payment));
            }
            StepForm::Complete => return SubmitStart::Settled(Transition::Unavailable),
            StepForm::Payment(form) => {
                let Some(reservation) = self.context.reservation() else {
                    return SubmitStart::Settled(Transition::Unavailable);
                };
                let card = form.freeze();
                let body = CardSubmission::new(&card, reservation);
                ServiceRequest::Card { card, body }
            }
            StepForm::Verification(code) => ServiceRequest::Otp(OtpSubmission {
                otp: code.joined(),
            }),
        };

        self.state.errors.clear_field(Field::Submit);
        let guard = self.state.submitting.claim();
        SubmitStart::Dispatch(self.submission(request, guard))
    }

    /// Starts a resend of the verification code. Only one resend may be in flight.
    pub fn begin_resend(&mut self) -> SubmitStart {
        if self.step() != Step::Verification {
            return SubmitStart::Settled(Transition::Unavailable);
        }
        if self.is_resending() {
            return SubmitStart::Settled(Transition::Busy);
        }
        let guard = self.state.resending.claim();
        SubmitStart::Dispatch(self.submission(ServiceRequest::Resend, guard))
    }

    /// Applies a service response. Responses for a step the user has since
    /// left are dropped without touching state.
    pub fn complete(&mut self, outcome: SubmissionOutcome) -> Transition {
        let SubmissionOutcome {
            ticket,
            request,
            result,
            guard,
        } = outcome;
        drop(guard);

        if ticket.epoch != self.epoch || ticket.step != self.step() {
            debug!(step = %ticket.step, "discarding response for a step no longer active");
            return Transition::Stale;
        }

        match request {
            ServiceRequest::Resend => match result {
                Ok(()) => {
                    if let StepForm::Verification(code) = &mut self.state.form {
                        code.clear();
                    }
                    self.state.errors.clear_field(Field::Otp);
                    self.state.errors.clear_field(Field::Submit);
                    info!("verification code resent");
                    Transition::CodeResent
                }
                Err(e) => self.fail(e, RESEND_FAILED),
            },
            ServiceRequest::Card { card, .. } => match result {
                Ok(()) => {
                    let extended = self.context.with_card(card);
                    self.extend_and_advance(extended, Step::Verification)
                }
                Err(e) => self.fail(e, CARD_FAILED),
            },
            ServiceRequest::Otp(body) => match result {
                Ok(()) => {
                    let extended = self
                        .context
                        .with_otp(OtpConfirmation { code: body.otp })
                        .and_then(|ctx| ctx.with_booking_id(BookingId::generate()));
                    self.extend_and_advance(extended, Step::Complete)
                }
                Err(e) => self.fail(e, OTP_FAILED),
            },
        }
    }

    /// Validates, calls the service when the step needs it, and applies the result.
    pub async fn submit(&mut self) -> Transition {
        match self.begin_submit() {
            SubmitStart::Settled(transition) => transition,
            SubmitStart::Dispatch(submission) => {
                let outcome = submission.dispatch().await;
                self.complete(outcome)
            }
        }
    }

    pub async fn resend(&mut self) -> Transition {
        match self.begin_resend() {
            SubmitStart::Settled(transition) => transition,
            SubmitStart::Dispatch(submission) => {
                let outcome = submission.dispatch().await;
                self.complete(outcome)
            }
        }
    }

    /// Leaves Verification for a fresh Reservation. Any response still in
    /// flight is discarded when it arrives.
    pub fn back(&mut self) -> Transition {
        if self.step() != Step::Verification {
            return Transition::Unavailable;
        }
        self.epoch += 1;
        self.context = WizardContext::new();
        self.state = StepState::enter(Step::Reservation);
        info!(from = %Step::Verification, to = %Step::Reservation, "wizard went back");
        Transition::Returned(Step::Reservation)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let mut fields = BTreeMap::new();
        let mut card_brand = None;
        match &self.state.form {
            StepForm::Reservation(form) => {
                fields.insert(Field::RoomType, form.room_type.clone());
                fields.insert(Field::CheckIn, form.check_in.clone());
                fields.insert(Field::CheckOut, form.check_out.clone());
                fields.insert(Field::Guests, form.guests.clone());
                fields.insert(Field::Amount, form.amount.clone());
            }
            StepForm::Payment(form) => {
                fields.insert(Field::CardNumber, form.display_number());
                fields.insert(Field::CardName, form.holder_name().to_string());
                fields.insert(Field::Expiry, form.display_expiry());
                fields.insert(Field::Cvv, "•".repeat(form.cvv().len()));
                card_brand = Some(form.brand());
            }
            StepForm::Verification(code) => {
                let cells: String = (0..OTP_LENGTH)
                    .map(|i| code.cell(i).unwrap_or('_'))
                    .collect();
                fields.insert(Field::Otp, cells);
            }
            StepForm::Checkout | StepForm::Complete => {}
        }

        WizardSnapshot {
            step: self.step(),
            title: self.step().title(),
            fields,
            card_brand,
            errors: self.state.errors.clone(),
            submitting: self.is_submitting(),
            resending: self.is_resending(),
            can_submit: self.can_submit(),
            context: self.context.view(self.currency),
        }
    }

    fn submission(&self, request: ServiceRequest, guard: InFlightGuard) -> Submission {
        Submission {
            ticket: Ticket {
                epoch: self.epoch,
                step: self.step(),
            },
            request,
            service: self.service.clone(),
            guard,
        }
    }

    fn advance(&mut self, to: Step) -> Transition {
        let from = self.step();
        self.epoch += 1;
        self.state = StepState::enter(to);
        info!(from = %from, to = %to, "wizard advanced");
        Transition::Advanced(to)
    }

    fn extend_and_advance(&mut self, extended: Result<WizardContext>, to: Step) -> Transition {
        match extended {
            Ok(context) => {
                self.context = context;
                self.advance(to)
            }
            Err(e) => {
                warn!(step = %self.step(), error = %e, "context could not be extended");
                self.state.errors.insert(Field::Submit, e.to_string());
                Transition::Failed
            }
        }
    }

    fn fail(&mut self, error: WizardError, message: &str) -> Transition {
        warn!(step = %self.step(), error = %error, "payment service call failed");
        self.state.errors.insert(Field::Submit, message);
        Transition::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PaymentService;
    use crate::infrastructure::in_memory::InMemoryPaymentService;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Never answers its first card submission; later calls go through.
    struct StallsOnce {
        stalled: AtomicBool,
        inner: InMemoryPaymentService,
    }

    #[async_trait]
    impl PaymentService for StallsOnce {
        async fn submit_card(&self, request: &CardSubmission) -> Result<()> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.inner.submit_card(request).await
        }

        async fn submit_otp(&self, request: &OtpSubmission) -> Result<()> {
            self.inner.submit_otp(request).await
        }

        async fn resend_otp(&self) -> Result<()> {
            self.inner.resend_otp().await
        }
    }

    fn controller() -> (WizardController, InMemoryPaymentService) {
        let service = InMemoryPaymentService::new();
        (WizardController::new(Arc::new(service.clone())), service)
    }

    fn fill_reservation(wizard: &mut WizardController) {
        assert!(wizard.input(Field::RoomType, "Suite"));
        assert!(wizard.input(Field::CheckIn, "2024-06-01"));
        assert!(wizard.input(Field::CheckOut, "2024-06-03"));
        assert!(wizard.input(Field::Guests, "2"));
        assert!(wizard.input(Field::Amount, "5000"));
    }

    fn fill_card(wizard: &mut WizardController) {
        assert!(wizard.input(Field::CardNumber, "4111 1111 1111 1111"));
        assert!(wizard.input(Field::CardName, "john doe"));
        assert!(wizard.input(Field::Expiry, "12/25"));
        assert!(wizard.input(Field::Cvv, "123"));
    }

    async fn at_payment() -> (WizardController, InMemoryPaymentService) {
        let (mut wizard, service) = controller();
        fill_reservation(&mut wizard);
        assert_eq!(wizard.submit().await, Transition::Advanced(Step::Checkout));
        assert_eq!(wizard.submit().await, Transition::Advanced(Step::Payment));
        (wizard, service)
    }

    async fn at_verification() -> (WizardController, InMemoryPaymentService) {
        let (mut wizard, service) = at_payment().await;
        fill_card(&mut wizard);
        assert_eq!(
            wizard.submit().await,
            Transition::Advanced(Step::Verification)
        );
        (wizard, service)
    }

    #[tokio::test]
    async fn test_invalid_reservation_stays_and_reports_all_fields() {
        let (mut wizard, _service) = controller();
        wizard.input(Field::CheckIn, "2024-05-10");
        wizard.input(Field::CheckOut, "2024-05-09");
        wizard.input(Field::Guests, "0");
        wizard.input(Field::Amount, "0");

        assert_eq!(wizard.submit().await, Transition::Invalid);
        assert_eq!(wizard.step(), Step::Reservation);
        assert_eq!(wizard.errors().len(), 4);
        assert!(wizard.context().reservation().is_none());
    }

    #[tokio::test]
    async fn test_editing_a_field_clears_its_error() {
        let (mut wizard, _service) = controller();
        wizard.submit().await;
        assert!(wizard.errors().contains(Field::RoomType));

        wizard.input(Field::RoomType, "Deluxe");
        assert!(!wizard.errors().contains(Field::RoomType));
        assert!(wizard.errors().contains(Field::Guests));
    }

    #[tokio::test]
    async fn test_checkout_shows_reservation_unchanged() {
        let (mut wizard, _service) = controller();
        fill_reservation(&mut wizard);
        wizard.submit().await;

        assert_eq!(wizard.step(), Step::Checkout);
        assert!(wizard.can_submit());
        let summary = wizard.summary();
        assert_eq!(summary.room_type, "Suite");
        assert_eq!(summary.check_in, "2024-06-01");
        assert_eq!(summary.check_out, "2024-06-03");
        assert_eq!(summary.guests, "2");
    }

    #[tokio::test]
    async fn test_fields_of_other_steps_are_refused() {
        let (mut wizard, _service) = controller();
        assert!(!wizard.input(Field::CardNumber, "4111"));
        assert!(!wizard.enter_otp_digit(0, "1"));
        assert!(!wizard.input(Field::Guests, "two"));
        assert_eq!(wizard.reservation_form().unwrap().guests, "");
    }

    #[tokio::test]
    async fn test_invalid_card_never_reaches_service() {
        let (mut wizard, service) = at_payment().await;
        fill_card(&mut wizard);
        wizard.input(Field::CardNumber, "411111111111");

        assert_eq!(wizard.submit().await, Transition::Invalid);
        assert_eq!(wizard.errors().len(), 1);
        assert!(wizard.errors().contains(Field::CardNumber));
        assert!(service.card_submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_card_submission_carries_brand_and_reservation() {
        let (wizard, service) = at_verification().await;

        let sent = service.card_submissions().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].card_number, "4111111111111111");
        assert_eq!(sent[0].card_name, "JOHN DOE");
        assert_eq!(sent[0].expiry, "1225");
        assert_eq!(sent[0].detected_brand, CardBrand::Visa);
        assert_eq!(sent[0].reservation.room_type(), "Suite");

        assert_eq!(wizard.context().card().unwrap().brand, CardBrand::Visa);
    }

    #[tokio::test]
    async fn test_card_failure_keeps_values_and_reports_submit_error() {
        let (mut wizard, service) = at_payment().await;
        service.reject_cards(true);
        fill_card(&mut wizard);

        assert_eq!(wizard.submit().await, Transition::Failed);
        assert_eq!(wizard.step(), Step::Payment);
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.errors().get(Field::Submit), Some(CARD_FAILED));
        assert_eq!(wizard.card_form().unwrap().number(), "4111111111111111");
        assert!(wizard.context().card().is_none());

        service.reject_cards(false);
        assert_eq!(
            wizard.submit().await,
            Transition::Advanced(Step::Verification)
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_a_no_op() {
        let (mut wizard, service) = at_payment().await;
        fill_card(&mut wizard);

        let SubmitStart::Dispatch(pending) = wizard.begin_submit() else {
            panic!("expected a dispatch");
        };
        assert!(wizard.is_submitting());
        assert!(!wizard.can_submit());
        assert!(matches!(
            wizard.begin_submit(),
            SubmitStart::Settled(Transition::Busy)
        ));

        let outcome = pending.dispatch().await;
        assert_eq!(
            wizard.complete(outcome),
            Transition::Advanced(Step::Verification)
        );
        assert_eq!(service.card_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_submission_releases_the_step() {
        let (mut wizard, service) = at_payment().await;
        fill_card(&mut wizard);

        let start = wizard.begin_submit();
        assert!(matches!(start, SubmitStart::Dispatch(_)));
        assert!(wizard.is_submitting());
        drop(start);

        assert!(!wizard.is_submitting());
        assert!(wizard.can_submit());
        assert_eq!(
            wizard.submit().await,
            Transition::Advanced(Step::Verification)
        );
        assert_eq!(service.card_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_submit_can_be_retried() {
        let inner = InMemoryPaymentService::new();
        let service = StallsOnce {
            stalled: AtomicBool::new(false),
            inner: inner.clone(),
        };
        let mut wizard = WizardController::new(Arc::new(service));
        fill_reservation(&mut wizard);
        wizard.submit().await;
        wizard.submit().await;
        fill_card(&mut wizard);

        let cancelled = tokio::time::timeout(Duration::from_millis(20), wizard.submit()).await;
        assert!(cancelled.is_err());
        assert_eq!(wizard.step(), Step::Payment);
        assert!(!wizard.is_submitting());

        assert_eq!(
            wizard.submit().await,
            Transition::Advanced(Step::Verification)
        );
        assert_eq!(inner.card_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_otp_submit_disabled_until_six_digits() {
        let (mut wizard, service) = at_verification().await;
        for (i, d) in "12345".chars().enumerate() {
            assert!(wizard.enter_otp_digit(i, &d.to_string()));
        }
        assert!(!wizard.can_submit());
        assert_eq!(wizard.submit().await, Transition::Invalid);
        assert_eq!(
            wizard.errors().get(Field::Otp),
            Some("Please enter complete 6-digit code")
        );
        assert!(service.otp_submissions().await.is_empty());

        wizard.enter_otp_digit(5, "6");
        assert!(wizard.can_submit());
        assert!(!wizard.errors().contains(Field::Otp));
    }

    #[tokio::test]
    async fn test_verification_sends_only_the_code_and_completes() {
        let (mut wizard, service) = at_verification().await;
        assert!(wizard.paste_otp("123 456"));

        assert_eq!(wizard.submit().await, Transition::Advanced(Step::Complete));

        let sent = service.otp_submissions().await;
        assert_eq!(sent, vec![OtpSubmission { otp: "123456".to_string() }]);
        let booking = wizard.context().booking_id().unwrap();
        assert!(booking.as_str().starts_with("PR"));
        assert_eq!(wizard.context().otp().unwrap().code, "123456");
        assert!(!wizard.can_submit());
        assert_eq!(wizard.submit().await, Transition::Unavailable);
    }

    #[tokio::test]
    async fn test_otp_failure_stays_on_verification() {
        let (mut wizard, service) = at_verification().await;
        service.reject_codes(true);
        wizard.paste_otp("654321");

        assert_eq!(wizard.submit().await, Transition::Failed);
        assert_eq!(wizard.step(), Step::Verification);
        assert_eq!(wizard.errors().get(Field::Submit), Some(OTP_FAILED));
        assert_eq!(wizard.otp().unwrap().joined(), "654321");
    }

    #[tokio::test]
    async fn test_resend_clears_cells() {
        let (mut wizard, service) = at_verification().await;
        wizard.paste_otp("123456");

        let SubmitStart::Dispatch(pending) = wizard.begin_resend() else {
            panic!("expected a dispatch");
        };
        assert!(wizard.is_resending());
        assert!(matches!(
            wizard.begin_resend(),
            SubmitStart::Settled(Transition::Busy)
        ));

        assert_eq!(wizard.complete(pending.dispatch().await), Transition::CodeResent);
        assert!(!wizard.is_resending());
        assert_eq!(wizard.otp().unwrap().joined(), "");
        assert_eq!(service.resend_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_resend_keeps_cells_and_reports_submit_error() {
        let (mut wizard, service) = at_verification().await;
        service.reject_resends(true);
        wizard.paste_otp("123456");

        assert_eq!(wizard.resend().await, Transition::Failed);
        assert!(!wizard.is_resending());
        assert_eq!(wizard.step(), Step::Verification);
        assert_eq!(wizard.errors().get(Field::Submit), Some(RESEND_FAILED));
        assert_eq!(wizard.otp().unwrap().joined(), "123456");

        service.reject_resends(false);
        assert_eq!(wizard.resend().await, Transition::CodeResent);
        assert!(!wizard.errors().contains(Field::Submit));
    }

    #[tokio::test]
    async fn test_resend_answer_after_back_is_stale() {
        let (mut wizard, _service) = at_verification().await;

        let SubmitStart::Dispatch(pending) = wizard.begin_resend() else {
            panic!("expected a dispatch");
        };
        assert_eq!(wizard.back(), Transition::Returned(Step::Reservation));
        assert!(!wizard.is_resending());

        assert_eq!(wizard.complete(pending.dispatch().await), Transition::Stale);
        assert_eq!(wizard.step(), Step::Reservation);
        assert!(wizard.errors().is_empty());
        assert!(wizard.reservation_form().is_some());
    }

    #[tokio::test]
    async fn test_backspace_on_filled_cell_clears_code_error() {
        let (mut wizard, _service) = at_verification().await;
        wizard.paste_otp("12345");
        assert_eq!(wizard.submit().await, Transition::Invalid);

        assert!(wizard.otp_backspace(5));
        assert!(wizard.errors().contains(Field::Otp));

        assert!(wizard.otp_backspace(4));
        assert!(!wizard.errors().contains(Field::Otp));
        assert_eq!(wizard.otp().unwrap().joined(), "1234");
    }

    #[tokio::test]
    async fn test_resend_outside_verification_is_unavailable() {
        let (mut wizard, service) = controller();
        assert_eq!(wizard.resend().await, Transition::Unavailable);
        assert_eq!(service.resend_count(), 0);
    }

    #[tokio::test]
    async fn test_back_resets_context_and_discards_late_response() {
        let (mut wizard, service) = at_verification().await;
        wizard.paste_otp("123456");

        let SubmitStart::Dispatch(pending) = wizard.begin_submit() else {
            panic!("expected a dispatch");
        };
        assert_eq!(wizard.back(), Transition::Returned(Step::Reservation));
        assert!(wizard.context().reservation().is_none());

        let outcome = pending.dispatch().await;
        assert_eq!(wizard.complete(outcome), Transition::Stale);
        assert_eq!(wizard.step(), Step::Reservation);
        assert!(wizard.context().booking_id().is_none());
        assert!(!wizard.is_submitting());
        assert_eq!(service.otp_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_back_only_from_verification() {
        let (mut wizard, _service) = at_payment().await;
        assert_eq!(wizard.back(), Transition::Unavailable);
        assert_eq!(wizard.step(), Step::Payment);
    }

    #[tokio::test]
    async fn test_snapshot_masks_sensitive_input() {
        let (mut wizard, _service) = at_payment().await;
        fill_card(&mut wizard);

        let snapshot = wizard.snapshot();
        assert_eq!(snapshot.step, Step::Payment);
        assert_eq!(
            snapshot.fields.get(&Field::CardNumber).unwrap(),
            "4111 1111 1111 1111"
        );
        assert_eq!(snapshot.fields.get(&Field::Cvv).unwrap(), "•••");
        assert_eq!(snapshot.card_brand, Some(CardBrand::Visa));
        assert!(snapshot.can_submit);
        assert_eq!(snapshot.context.reservation.amount, "₱5,000.00");
    }
}
