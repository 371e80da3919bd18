use roadrater::cars::Car;
use roadrater::config::Config;

#[tokio::test]
async fn test_upsert_keeps_one_row_per_plate() {
    let config = Config::new_test().await.unwrap();

    assert!(config.save_car(&Car::new("ABC123", "Toyota", "Corolla", "2012")).await.unwrap());
    assert!(!config.save_car(&Car::new("ABC123", "Toyota", "Auris", "2013")).await.unwrap());

    let cars = config.list_cars().await.unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].model, "Auris");
    assert_eq!(cars[0].year, "2013");

    let info = config.db_info().await.unwrap();
    assert_eq!(info.car_count, 1);
}

#[tokio::test]
async fn test_get_list_and_remove() {
    let config = Config::new_test().await.unwrap();
    let golf = Car::new("GOLF1", "Volkswagen", "Golf", "2008");
    config.save_car(&golf).await.unwrap();
    config.save_car(&Car::new("POLO2", "Volkswagen", "Polo", "2016")).await.unwrap();
    config.save_car(&Car::new("FIT3", "Honda", "Fit", "2011")).await.unwrap();

    assert_eq!(config.get_car("GOLF1").await.unwrap(), Some(golf));

    let plates: Vec<String> = config
        .list_cars()
        .await
        .unwrap()
        .into_iter()
        .map(|car| car.number_plate)
        .collect();
    assert_eq!(plates, vec!["FIT3", "GOLF1", "POLO2"]);

    let volkswagens = config.list_cars_by_make("volkswagen").await.unwrap();
    assert_eq!(volkswagens.len(), 2);

    config.delete_car("GOLF1").await.unwrap();
    assert_eq!(config.get_car("GOLF1").await.unwrap(), None);

    let err = config.delete_car("GOLF1").await.unwrap_err();
    assert_eq!(err.to_string(), "Car 'GOLF1' not found");
}
