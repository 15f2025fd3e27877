//! Runs the facade against a real deployment.
//!
//! Ignored by default. Run with:
//!
//! ```sh
//! DOCQUERY_MONGODB_URI=mongodb://localhost:27017 cargo test -p docquery-mongodb -- --ignored
//! ```

use bson::{doc, oid::ObjectId};
use docquery_core::{
    pool::ClientPool,
    request::{DeleteRequest, InsertRequest, QueryRequest, RawQueryRequest, UpdateRequest},
    target::ConnectionTarget,
};
use docquery_mongodb::MongoConnector;

#[tokio::test]
#[ignore = "needs a MongoDB deployment in DOCQUERY_MONGODB_URI"]
async fn crud_round_trip_against_live_server() {
    let uri = std::env::var("DOCQUERY_MONGODB_URI").expect("DOCQUERY_MONGODB_URI must be set");
    let pool = ClientPool::connect(MongoConnector::new().verify_on_connect(true), &uri)
        .await
        .unwrap();
    let target = ConnectionTarget::new(&uri, "docquery_test", format!("people_{}", ObjectId::new()));

    assert!(QueryRequest::new(target.clone()).find_all(&pool).await.unwrap().is_empty());

    for (name, age) in [("a", 5), ("b", 10)] {
        InsertRequest::new(target.clone(), doc! { "name": name, "age": age })
            .insert_one(&pool)
            .await
            .unwrap();
    }

    let older = RawQueryRequest::new(target.clone(), doc! { "age": { "$gt": 7 } })
        .find_raw(&pool)
        .await
        .unwrap();
    assert_eq!(older.len(), 1);
    assert_eq!(older[0].get_str("name").unwrap(), "b");

    let outcome = UpdateRequest::new(target.clone(), "name", "a", doc! { "age": 6 })
        .update_one(&pool)
        .await
        .unwrap();
    assert_eq!(outcome.matched_count, 1);

    let unmatched = DeleteRequest::new(target.clone(), "name", "zzz")
        .delete_one(&pool)
        .await
        .unwrap();
    assert!(unmatched.is_unmatched());

    let a = QueryRequest::new(target.clone())
        .with_criterion("name", "a")
        .find_one(&pool)
        .await
        .unwrap();
    assert_eq!(a.get_i32("age").unwrap(), 6);

    pool.client(&uri)
        .await
        .unwrap()
        .inner()
        .database("docquery_test")
        .collection::<bson::Document>(&target.collection)
        .drop()
        .await
        .unwrap();
    pool.shutdown().await.unwrap();
}
