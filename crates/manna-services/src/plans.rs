//! Reading plans and per-user progress.

use chrono::Utc;
use manna_core::{
  Error, Fetched, Result,
  fallback::write_failed,
  fetch_with_fallback,
  plan::{Difficulty, NewReadingPlan, ReadingPlan, UserReadingPlan},
  store::{Query, RemoteStore, Row},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  counter, failed_write,
  rows::{self, READING_PLANS, ReadingPlanRow, USER_READING_PLANS, UserReadingPlanRow},
  seed, service,
};

const ENTITY: &str = "reading_plans";
const MAX_ATTEMPTS: usize = 5;

service!(
  /// Plan templates (`reading_plans`) and enrolments (`user_reading_plans`).
  PlanService
);

impl<S: RemoteStore> PlanService<S> {
  async fn select(&self, query: &Query) -> Result<Vec<ReadingPlan>> {
    let rows = self
      .store
      .select(READING_PLANS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<ReadingPlanRow, _>(READING_PLANS, rows)
  }

  async fn enrolment(&self, user: Uuid, plan: Uuid) -> Result<Option<UserReadingPlan>> {
    let query = Query::new().eq("user_id", user).eq("plan_id", plan);
    let rows = self
      .store
      .select(USER_READING_PLANS, &query)
      .await
      .map_err(Error::remote)?;
    Ok(
      rows::decode_all::<UserReadingPlanRow, _>(USER_READING_PLANS, rows)?
        .into_iter()
        .next(),
    )
  }

  async fn load(&self, id: Uuid) -> Result<ReadingPlan> {
    self
      .select(&Query::by_id(id))
      .await
      .map_err(|e| write_failed(ENTITY, e))?
      .pop()
      .ok_or(Error::NotFound { entity: ENTITY, id })
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  pub async fn list(&self, difficulty: Option<Difficulty>) -> Fetched<Vec<ReadingPlan>> {
    let mut query = Query::new().order_by("created_at", false);
    if let Some(d) = difficulty {
      query = query.eq("difficulty", d);
    }
    fetch_with_fallback(ENTITY, self.select(&query), || seed::READING_PLANS.clone()).await
  }

  pub async fn get(&self, id: Uuid) -> Fetched<Option<ReadingPlan>> {
    fetch_with_fallback(
      ENTITY,
      async { Ok::<_, Error>(self.select(&Query::by_id(id)).await?.pop()) },
      || seed::READING_PLANS.iter().find(|p| p.id == id).cloned(),
    )
    .await
  }

  /// The plans `user` has started.
  pub async fn user_plans(&self, user: Uuid) -> Fetched<Vec<UserReadingPlan>> {
    let call = async {
      let rows = self
        .store
        .select(
          USER_READING_PLANS,
          &Query::new().eq("user_id", user).order_by("started_at", true),
        )
        .await
        .map_err(Error::remote)?;
      rows::decode_all::<UserReadingPlanRow, _>(USER_READING_PLANS, rows)
    };
    fetch_with_fallback(USER_READING_PLANS, call, Vec::new).await
  }

  // ─── Writes ───────────────────────────────────────────────────────────────

  pub async fn create(&self, author: Uuid, draft: NewReadingPlan) -> Result<ReadingPlan> {
    draft.validate()?;

    let mut days = draft.days;
    days.sort_by_key(|d| d.day);
    let plan = ReadingPlan {
      id: Uuid::new_v4(),
      author_id: Some(author),
      title: draft.title.trim().to_owned(),
      description: draft.description,
      duration_days: draft.duration_days,
      difficulty: draft.difficulty,
      days,
      participants: 0,
      rating: 0.0,
      created_at: Utc::now(),
    };
    let stored = self
      .store
      .insert(READING_PLANS, rows::encode(&ReadingPlanRow::from(&plan))?)
      .await
      .map_err(failed_write(ENTITY))?;

    tracing::info!(id = %plan.id, %author, "reading plan created");
    Ok(rows::decode::<ReadingPlanRow>(READING_PLANS, stored)?.into())
  }

  /// Enrol `user` in `plan`. Starting a plan twice returns the existing
  /// enrolment.
  pub async fn start(&self, user: Uuid, plan: Uuid) -> Result<UserReadingPlan> {
    self.load(plan).await?;
    if let Some(existing) = self
      .enrolment(user, plan)
      .await
      .map_err(|e| write_failed(USER_READING_PLANS, e))?
    {
      return Ok(existing);
    }

    let row = rows::encode(&UserReadingPlanRow {
      id:             Uuid::new_v4(),
      user_id:        user,
      plan_id:        plan,
      completed_days: 0,
      started_at:     Utc::now(),
      completed_at:   None,
    })?;
    let stored = self
      .store
      .insert(USER_READING_PLANS, row)
      .await
      .map_err(failed_write(USER_READING_PLANS))?;

    // The enrolment stands even if the aggregate count lags behind.
    if let Err(e) = counter::bump(&*self.store, READING_PLANS, "participants", plan, 1).await {
      tracing::warn!(%plan, error = %e, "failed to update participant count");
    }
    Ok(rows::decode::<UserReadingPlanRow>(USER_READING_PLANS, stored)?.into())
  }

  /// Record that `user` finished `day` of `plan`. Progress only moves
  /// forward; completing an earlier day again is a no-op.
  pub async fn complete_day(&self, user: Uuid, plan: Uuid, day: u32) -> Result<UserReadingPlan> {
    let template = self.load(plan).await?;
    if day == 0 || day > template.duration_days {
      return Err(Error::Invalid(format!(
        "day {day} is outside 1..={}",
        template.duration_days
      )));
    }

    for _ in 0..MAX_ATTEMPTS {
      let current = self
        .enrolment(user, plan)
        .await
        .map_err(|e| write_failed(USER_READING_PLANS, e))?
        .ok_or(Error::NotFound {
          entity: USER_READING_PLANS,
          id:     plan,
        })?;
      if day <= current.completed_days {
        return Ok(current);
      }

      let mut patch = Row::new();
      patch.insert("completed_days".into(), json!(day));
      if day == template.duration_days {
        patch.insert("completed_at".into(), json!(Utc::now()));
      }
      let guard = Query::by_id(current.id).eq("completed_days", current.completed_days);
      let written = self
        .store
        .update(USER_READING_PLANS, &guard, patch)
        .await
        .map_err(failed_write(USER_READING_PLANS))?;
      if let Some(row) = written.into_iter().next() {
        return Ok(rows::decode::<UserReadingPlanRow>(USER_READING_PLANS, row)?.into());
      }
    }
    Err(Error::Contention {
      table:  USER_READING_PLANS,
      column: "completed_days",
      id:     plan,
    })
  }
}
