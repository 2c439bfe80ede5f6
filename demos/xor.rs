use rmsnet::{Matrix, TrainConfig, Trainer};

fn main() -> rmsnet::Result<()> {
    env_logger::init();

    let mut trainer = Trainer::with_seed(&[2, 8, 2], 42)?;

    let inputs = Matrix::from_rows(vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ])?;
    let labels = [1, 0, 1, 0];

    let config = TrainConfig::new(0.01);
    let epochs = 2000;

    for epoch in 0..epochs {
        let loss = trainer.fit(&inputs, &labels, &config)?;
        if epoch % 200 == 0 {
            println!("Epoch {epoch}: loss = {loss:.6}");
        }
    }

    let predictions = trainer.predict(&inputs)?;
    for (row, class) in inputs.data.iter().zip(predictions.iter()) {
        println!("Input: {:?} -> Class: {}", row, class);
    }
    println!("accuracy: {:.2}", trainer.accuracy(&inputs, &labels)?);
    Ok(())
}
